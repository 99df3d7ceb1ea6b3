use async_trait::async_trait;
use fileward_core::{AttributeValue, FileError, FileResult, Owner};
use std::collections::HashMap;

/// An [`Owner`] kept entirely in memory.
///
/// Holds current and last-persisted attribute values and counts how often
/// each persistence primitive ran.
#[derive(Debug, Clone)]
pub struct MemoryRecord {
    owner_type: String,
    id: String,
    new_record: bool,
    destroyed: bool,
    attributes: HashMap<String, AttributeValue>,
    persisted: HashMap<String, String>,
    validation_errors: Vec<String>,
    persist_calls: usize,
    update_calls: usize,
}

impl MemoryRecord {
    /// A record that has never been persisted
    pub fn new(owner_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            owner_type: owner_type.into(),
            id: id.into(),
            new_record: true,
            destroyed: false,
            attributes: HashMap::new(),
            persisted: HashMap::new(),
            validation_errors: Vec::new(),
            persist_calls: 0,
            update_calls: 0,
        }
    }

    /// An already persisted record with the given attributes
    pub fn stored<I, K, V>(owner_type: impl Into<String>, id: impl Into<String>, attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut record = Self::new(owner_type, id);
        record.new_record = false;
        for (name, value) in attributes {
            let (name, value) = (name.into(), value.into());
            record
                .attributes
                .insert(name.clone(), AttributeValue::Text(value.clone()));
            record.persisted.insert(name, value);
        }
        record
    }

    /// Make [`Owner::validate`] report `errors`
    pub fn set_validation_errors(&mut self, errors: Vec<String>) {
        self.validation_errors = errors;
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).and_then(AttributeValue::as_text)
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn persist_calls(&self) -> usize {
        self.persist_calls
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls
    }
}

#[async_trait]
impl Owner for MemoryRecord {
    fn owner_type(&self) -> &str {
        &self.owner_type
    }

    fn owner_id(&self) -> String {
        self.id.clone()
    }

    fn is_new_record(&self) -> bool {
        self.new_record
    }

    fn attribute(&self, name: &str) -> AttributeValue {
        self.attributes.get(name).cloned().unwrap_or_default()
    }

    fn set_attribute(&mut self, name: &str, value: AttributeValue) {
        self.attributes.insert(name.to_string(), value);
    }

    fn persisted_attribute(&self, name: &str) -> Option<String> {
        self.persisted.get(name).cloned()
    }

    async fn update_attributes(&mut self, values: &[(&str, String)]) -> FileResult<()> {
        if self.destroyed {
            return Err(FileError::Owner(format!(
                "{} {} was deleted",
                self.owner_type, self.id
            )));
        }
        for (name, value) in values {
            self.attributes
                .insert(name.to_string(), AttributeValue::Text(value.clone()));
            self.persisted.insert(name.to_string(), value.clone());
        }
        self.update_calls += 1;
        Ok(())
    }

    async fn persist(&mut self) -> FileResult<()> {
        let mut persisted = HashMap::new();
        for (name, value) in &self.attributes {
            match value {
                AttributeValue::Text(text) => {
                    persisted.insert(name.clone(), text.clone());
                }
                AttributeValue::Empty => {}
                AttributeValue::Uploads(_) => {
                    return Err(FileError::Owner(format!(
                        "attribute {} still holds uploads",
                        name
                    )));
                }
            }
        }
        self.persisted = persisted;
        self.new_record = false;
        self.persist_calls += 1;
        Ok(())
    }

    async fn destroy(&mut self) -> FileResult<()> {
        self.destroyed = true;
        Ok(())
    }

    fn validate(&self) -> Vec<String> {
        self.validation_errors.clone()
    }
}
