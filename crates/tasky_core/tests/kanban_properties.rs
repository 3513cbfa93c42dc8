use proptest::prelude::*;
use tasky_core::{BaseKey, KanbanBoard, Lane, MemoryKvStore, NewTask, TaskId};

const SEEDED_TASKS: usize = 5;

/// One board edit; `task` past the seeded range names a task that does not exist.
#[derive(Debug, Clone)]
enum LaneOp {
    Move {
        task: usize,
        from: Lane,
        to: Lane,
        index: Option<usize>,
    },
    Reorder {
        lane: Lane,
        from: usize,
        to: usize,
    },
}

fn lane_strategy() -> impl Strategy<Value = Lane> {
    prop_oneof![
        Just(Lane::Todo),
        Just(Lane::InProgress),
        Just(Lane::Parked),
        Just(Lane::Done),
    ]
}

fn op_strategy() -> impl Strategy<Value = LaneOp> {
    prop_oneof![
        (
            0..SEEDED_TASKS + 2,
            lane_strategy(),
            lane_strategy(),
            proptest::option::of(0_usize..10),
        )
            .prop_map(|(task, from, to, index)| LaneOp::Move {
                task,
                from,
                to,
                index,
            }),
        (lane_strategy(), 0_usize..8, 0_usize..8)
            .prop_map(|(lane, from, to)| LaneOp::Reorder { lane, from, to }),
    ]
}

fn occurrences(board: &KanbanBoard<'_, MemoryKvStore>, task_id: TaskId) -> usize {
    Lane::ALL
        .iter()
        .map(|lane| {
            board
                .lane(*lane)
                .iter()
                .filter(|task| task.id == task_id)
                .count()
        })
        .sum()
}

proptest! {
    #[test]
    fn any_edit_sequence_keeps_every_task_in_exactly_one_lane(
        ops in proptest::collection::vec(op_strategy(), 0..40)
    ) {
        let store = MemoryKvStore::new();
        let base = BaseKey::new("kanban").unwrap();
        let mut board = KanbanBoard::open(&store, &base, None).unwrap();
        let ids: Vec<TaskId> = (0..SEEDED_TASKS)
            .map(|n| board.add_task(NewTask::titled(format!("task {n}"))).unwrap().id)
            .collect();

        for op in ops {
            match op {
                LaneOp::Move { task, from, to, index } => {
                    let task_id = ids.get(task).copied().unwrap_or_else(TaskId::new_v4);
                    let held = board.lane(from).iter().any(|task| task.id == task_id);
                    let moved = board.move_task(task_id, from, to, index);
                    prop_assert_eq!(moved, held);
                }
                LaneOp::Reorder { lane, from, to } => {
                    let len = board.lane(lane).len();
                    let result = board.reorder_task(lane, from, to);
                    prop_assert_eq!(result.is_ok(), from < len && to < len);
                }
            }

            prop_assert_eq!(board.total_tasks(), SEEDED_TASKS);
            for task_id in &ids {
                prop_assert!(board.locate(*task_id).is_some());
                prop_assert_eq!(occurrences(&board, *task_id), 1);
            }
        }

        let reopened = KanbanBoard::open(&store, &base, None).unwrap();
        prop_assert_eq!(reopened.total_tasks(), SEEDED_TASKS);
        for lane in Lane::ALL {
            prop_assert_eq!(reopened.lane(lane), board.lane(lane));
        }
    }
}
