//! Task planning.
//!
//! A run consists of `entity_count * max_messages` tasks. Task `i` (0-based)
//! belongs to entity `start_id + floor(i / entity_count)`, so every id is
//! repeated `entity_count` times in a row.

use telemetry_core::SimulationConfig;

/// One unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Task {
    /// Position in the plan
    pub index: u64,
    /// Entity the message is generated for
    pub entity_id: i64,
}

/// Lazily expanded list of tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskPlan {
    entity_count: u64,
    max_messages: u64,
    start_id: i64,
}

impl TaskPlan {
    pub fn new(entity_count: u64, max_messages: u64, start_id: i64) -> Self {
        Self {
            entity_count,
            max_messages,
            start_id,
        }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(config.entity_count, config.max_messages, config.start_id)
    }

    /// Total number of tasks.
    ///
    /// Rounds whose entity id would pass `i64::MAX` are not part of the plan.
    pub fn len(&self) -> u64 {
        self.entity_count.saturating_mul(self.rounds())
    }

    /// Rounds with a representable entity id, at most `max_messages`.
    fn rounds(&self) -> u64 {
        let representable = i128::from(i64::MAX) - i128::from(self.start_id) + 1;
        u64::try_from(representable).map_or(self.max_messages, |n| n.min(self.max_messages))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entity id of task `index`, or `None` past the end of the plan.
    pub fn entity_id_at(&self, index: u64) -> Option<i64> {
        if index >= self.len() {
            return None;
        }
        let offset = i64::try_from(index / self.entity_count).ok()?;
        self.start_id.checked_add(offset)
    }

    /// Iterate tasks in plan order.
    pub fn iter(&self) -> TaskIter {
        TaskIter {
            plan: *self,
            next: 0,
        }
    }

    /// Iterate entity ids in plan order.
    pub fn entity_ids(&self) -> impl Iterator<Item = i64> {
        self.iter().map(|task| task.entity_id)
    }
}

impl IntoIterator for TaskPlan {
    type Item = Task;
    type IntoIter = TaskIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the tasks of a [`TaskPlan`].
#[derive(Debug, Clone)]
pub struct TaskIter {
    plan: TaskPlan,
    next: u64,
}

impl TaskIter {
    fn remaining(&self) -> u64 {
        self.plan.len().saturating_sub(self.next)
    }
}

impl Iterator for TaskIter {
    type Item = Task;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.next;
        let entity_id = self.plan.entity_id_at(index)?;
        self.next += 1;
        Some(Task { index, entity_id })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.remaining()).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TaskIter {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_ids_repeat_per_entity_count() {
        let plan = TaskPlan::new(3, 2, 10);
        let ids: Vec<i64> = plan.entity_ids().collect();
        assert_eq!(ids, vec![10, 10, 10, 11, 11, 11]);
    }

    #[test]
    fn test_plan_length() {
        for (entities, messages) in [(1, 1), (4, 7), (10, 1), (1, 10)] {
            let plan = TaskPlan::new(entities, messages, 1);
            assert_eq!(plan.len(), entities * messages);
            assert_eq!(plan.iter().count() as u64, entities * messages);
            assert_eq!(plan.iter().len() as u64, entities * messages);
        }
    }

    #[test]
    fn test_empty_plan() {
        assert!(TaskPlan::new(0, 5, 1).is_empty());
        assert!(TaskPlan::new(5, 0, 1).is_empty());
        assert_eq!(TaskPlan::new(0, 5, 1).iter().next(), None);
        assert!(!TaskPlan::new(1, 1, 1).is_empty());
    }

    #[test]
    fn test_task_indices_are_sequential() {
        let plan = TaskPlan::new(2, 3, 1);
        let indices: Vec<u64> = plan.iter().map(|t| t.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_entity_id_at() {
        let plan = TaskPlan::new(3, 2, 10);
        assert_eq!(plan.entity_id_at(0), Some(10));
        assert_eq!(plan.entity_id_at(2), Some(10));
        assert_eq!(plan.entity_id_at(3), Some(11));
        assert_eq!(plan.entity_id_at(5), Some(11));
        assert_eq!(plan.entity_id_at(6), None);
    }

    #[test]
    fn test_negative_start_id() {
        let plan = TaskPlan::new(1, 3, -1);
        assert_eq!(plan.entity_ids().collect::<Vec<_>>(), vec![-1, 0, 1]);
    }

    #[test]
    fn test_ids_stop_at_i64_max() {
        let plan = TaskPlan::new(2, 3, i64::MAX - 1);
        assert_eq!(plan.len(), 4);
        assert_eq!(plan.iter().len(), 4);
        assert_eq!(
            plan.entity_ids().collect::<Vec<_>>(),
            vec![i64::MAX - 1, i64::MAX - 1, i64::MAX, i64::MAX]
        );
        assert_eq!(plan.entity_id_at(4), None);

        assert_eq!(TaskPlan::new(1, 5, i64::MAX).len(), 1);
        assert_eq!(TaskPlan::new(1, u64::MAX, i64::MIN).len(), u64::MAX);
    }

    #[test]
    fn test_size_hint_shrinks() {
        let mut iter = TaskPlan::new(2, 2, 1).iter();
        assert_eq!(iter.len(), 4);
        iter.next();
        assert_eq!(iter.len(), 3);
    }

    #[test]
    fn test_from_config() {
        let config = SimulationConfig {
            entity_count: 4,
            max_messages: 3,
            start_id: 7,
            ..SimulationConfig::default()
        };
        let plan = TaskPlan::from_config(&config);
        assert_eq!(plan.len(), config.total_tasks());
        assert_eq!(plan.entity_ids().last(), Some(9));
    }
}
