use glam::Vec3;
use rustc_hash::FxHashMap;
use uuid::Uuid;

/// A message queued on an entity and drained by its script's on-event
/// handler. Payload is a flat string attribute map so scripts can read
/// it without a schema.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    pub sender: Uuid,
    attributes: FxHashMap<String, String>,
}

pub const ATTR_COLLISION: &str = "collision";
pub const ATTR_IMPULSE: &str = "impulse";
pub const ATTR_CONTACT_POINT: &str = "contact_point";
pub const ATTR_CHARACTER: &str = "character";

impl Event {
    pub fn new(sender: Uuid) -> Self {
        Event {
            sender,
            attributes: FxHashMap::default(),
        }
    }

    /// Build one half of a symmetric collision pair. `sender` is the other
    /// body involved.
    pub fn collision(sender: Uuid, impulse: f32, contact_point: Vec3, character: bool) -> Self {
        let mut event = Event::new(sender);
        event.set_attribute(ATTR_COLLISION, "true");
        event.set_attribute(ATTR_IMPULSE, &impulse.to_string());
        event.set_attribute(
            ATTR_CONTACT_POINT,
            &format!("{},{},{}", contact_point.x, contact_point.y, contact_point.z),
        );
        if character {
            event.set_attribute(ATTR_CHARACTER, "true");
        }
        event
    }

    pub fn set_attribute(&mut self, key: &str, value: &str) {
        self.attributes.insert(key.to_string(), value.to_string());
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn has_attribute(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    pub fn is_collision(&self) -> bool {
        self.has_attribute(ATTR_COLLISION)
    }
}
