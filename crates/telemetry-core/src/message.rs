//! Output record produced for one task.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// One telemetry message.
///
/// Fields keep their insertion order, so serialization follows the order in
/// which the message builder appended them (id, timestamp, lat, lon, values).
/// The entity id is also kept outside the field map so publishers can use it
/// as a partition key without knowing the configured id field name.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    entity_id: i64,
    fields: Map<String, Value>,
}

impl Message {
    /// Create an empty message for the given entity.
    pub fn new(entity_id: i64) -> Self {
        Self {
            entity_id,
            fields: Map::new(),
        }
    }

    /// Entity this message belongs to.
    pub fn entity_id(&self) -> i64 {
        self.entity_id
    }

    /// Append a field. Re-inserting a key replaces the value in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Field names in emission order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Borrow the underlying field map.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Encode the message as a JSON object.
    pub fn to_json_vec(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.fields)
    }

    /// Encode the message as a JSON object string.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.fields)
    }
}

impl Serialize for Message {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

impl From<Message> for Value {
    fn from(message: Message) -> Self {
        Value::Object(message.fields)
    }
}
