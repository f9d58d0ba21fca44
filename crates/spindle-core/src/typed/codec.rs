//! PayloadCodec - Task と保存形式（kind + JSON payload）の相互変換

use super::task::Task;
use crate::domain::{NewTask, StoreError, TaskError, TaskRecord};

/// Converts typed tasks to and from their stored form.
pub struct PayloadCodec;

impl PayloadCodec {
    pub fn encode<T: Task>(task: &T) -> Result<NewTask, StoreError> {
        let payload = serde_json::to_value(task)?;
        Ok(NewTask::new(T::kind(), payload))
    }

    /// Rebuild `T` from a stored record. The record's kind must be `T::KIND`.
    pub fn decode<T: Task>(record: &TaskRecord) -> Result<T, TaskError> {
        if record.kind.as_str() != T::KIND {
            return Err(TaskError::Decode {
                kind: record.kind.clone(),
                reason: format!("expected kind {}", T::KIND),
            });
        }
        serde_json::from_value(record.payload.clone()).map_err(|e| TaskError::Decode {
            kind: record.kind.clone(),
            reason: format!("json decode: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{TaskId, TaskKind};
    use crate::typed::task::fixtures::{EchoTask, OtherTask};
    use serde::ser::{Error as _, Serializer};
    use serde_json::json;

    struct Unserializable;

    impl serde::Serialize for Unserializable {
        fn serialize<S: Serializer>(&self, _s: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("refusing to serialize"))
        }
    }

    #[test]
    fn encode_tags_kind() {
        let new_task = PayloadCodec::encode(&EchoTask { value: 3 }).unwrap();
        assert_eq!(new_task.kind().as_str(), EchoTask::KIND);
        assert_eq!(new_task.payload(), &json!({"value": 3}));
    }

    #[test]
    fn decode_rejects_other_kind() {
        let new_task = PayloadCodec::encode(&OtherTask { name: "x".into() }).unwrap();
        let record = TaskRecord::pending(TaskId::new(1), new_task);
        let err = PayloadCodec::decode::<EchoTask>(&record).unwrap_err();
        assert!(matches!(err, TaskError::Decode { .. }));
    }

    #[test]
    fn decode_rejects_bad_payload() {
        let record = TaskRecord::pending(
            TaskId::new(1),
            NewTask::new(TaskKind::new(EchoTask::KIND), json!({"value": "nope"})),
        );
        let err = PayloadCodec::decode::<EchoTask>(&record).unwrap_err();
        assert!(err.to_string().contains("json decode"));
    }

    #[test]
    fn serialization_failure_is_store_error() {
        let err = serde_json::to_value(Unserializable).unwrap_err();
        let err = StoreError::from(err);
        assert!(matches!(err, StoreError::Serialization(_)));
    }
}
