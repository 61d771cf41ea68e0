use crate::config::TaskDef;
use crate::error::{BuildError, Result};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use tracing::info;

/// Executes a single task's action.
pub trait TaskRunner {
    fn run(&mut self, task: &TaskDef) -> Result<()>;
}

/// Named build tasks and their dependencies, validated to be acyclic.
#[derive(Debug)]
pub struct TaskGraph {
    tasks: Vec<TaskDef>,
    index: HashMap<String, usize>,
}

impl TaskGraph {
    pub fn new(tasks: Vec<TaskDef>) -> Result<Self> {
        let mut index = HashMap::new();
        for (i, task) in tasks.iter().enumerate() {
            if index.insert(task.name.clone(), i).is_some() {
                return Err(BuildError::DuplicateTask(task.name.clone()));
            }
        }
        for task in &tasks {
            for dep in &task.deps {
                if !index.contains_key(dep) {
                    return Err(BuildError::UnknownDependency {
                        task: task.name.clone(),
                        dep: dep.clone(),
                    });
                }
            }
        }

        let graph = Self { tasks, index };
        let all: HashSet<usize> = (0..graph.tasks.len()).collect();
        graph.topological_sort(&all)?;
        Ok(graph)
    }

    pub fn tasks(&self) -> &[TaskDef] {
        &self.tasks
    }

    /// Targets plus everything they depend on, dependencies first.
    pub fn plan(&self, targets: &[&str]) -> Result<Vec<&TaskDef>> {
        let mut selected = HashSet::new();
        let mut stack = Vec::new();
        for target in targets {
            let i = *self
                .index
                .get(*target)
                .ok_or_else(|| BuildError::UnknownTask(target.to_string()))?;
            stack.push(i);
        }
        while let Some(i) = stack.pop() {
            if selected.insert(i) {
                stack.extend(self.tasks[i].deps.iter().map(|d| self.index[d]));
            }
        }

        let order = self.topological_sort(&selected)?;
        Ok(order.into_iter().map(|i| &self.tasks[i]).collect())
    }

    /// Run the plan for `targets` one task at a time; stops at the first failure.
    pub fn run(&self, targets: &[&str], runner: &mut dyn TaskRunner) -> Result<()> {
        let plan = self.plan(targets)?;
        for task in plan {
            info!("Starting '{}'", task.name);
            runner.run(task).map_err(|e| BuildError::Task {
                task: task.name.clone(),
                source: Box::new(e),
            })?;
            info!("Finished '{}'", task.name);
        }
        Ok(())
    }

    // Kahn's algorithm over the selected subset; among ready tasks the earliest
    // declared runs first.
    fn topological_sort(&self, selected: &HashSet<usize>) -> Result<Vec<usize>> {
        let mut in_degree: HashMap<usize, usize> = HashMap::new();
        let mut dependents: HashMap<usize, Vec<usize>> = HashMap::new();
        for &i in selected {
            in_degree.insert(i, self.tasks[i].deps.len());
            for dep in &self.tasks[i].deps {
                dependents.entry(self.index[dep]).or_default().push(i);
            }
        }

        let mut ready: BinaryHeap<Reverse<usize>> = in_degree
            .iter()
            .filter(|&(_, &degree)| degree == 0)
            .map(|(&i, _)| Reverse(i))
            .collect();
        let mut result = Vec::with_capacity(selected.len());

        while let Some(Reverse(i)) = ready.pop() {
            result.push(i);
            if let Some(next) = dependents.get(&i) {
                for &n in next {
                    if let Some(degree) = in_degree.get_mut(&n) {
                        *degree -= 1;
                        if *degree == 0 {
                            ready.push(Reverse(n));
                        }
                    }
                }
            }
        }

        if result.len() != selected.len() {
            let placed: HashSet<usize> = result.iter().copied().collect();
            let mut stuck: HashSet<usize> = selected.difference(&placed).copied().collect();
            // Drop tasks that only wait on a cycle; keep the ones feeding it.
            loop {
                let feeding: HashSet<usize> = stuck
                    .iter()
                    .flat_map(|&i| self.tasks[i].deps.iter().map(|d| self.index[d]))
                    .filter(|d| stuck.contains(d))
                    .collect();
                if feeding.len() == stuck.len() {
                    break;
                }
                stuck = feeding;
            }
            let mut stuck: Vec<usize> = stuck.into_iter().collect();
            stuck.sort_unstable();
            return Err(BuildError::DependencyCycle(
                stuck.into_iter().map(|i| self.tasks[i].name.clone()).collect(),
            ));
        }
        Ok(result)
    }
}
