//! Domain model (ids, task records, states, errors).

pub mod errors;
pub mod ids;
pub mod state;
pub mod task;

pub use self::errors::{FetchError, ParseError, StoreError, TaskError, WorkerError};
pub use self::ids::TaskId;
pub use self::state::TaskStatus;
pub use self::task::{NewTask, TaskKind, TaskRecord};
