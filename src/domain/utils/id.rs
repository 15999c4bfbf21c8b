use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// String identifier tagged with the kind of entity it names, so an application id can never be
/// passed where a worker id is expected.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Serialize, Deserialize)]
#[serde(transparent, bound = "")]
pub struct Id<T> {
    pub id: String,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T> Id<T> {
    pub fn new(id: impl Into<String>) -> Self {
        Id { id: id.into(), _marker: PhantomData }
    }

    pub fn as_str(&self) -> &str {
        &self.id
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl<T> From<Id<T>> for String {
    fn from(id_wrapper: Id<T>) -> Self {
        id_wrapper.id
    }
}

impl<T> From<&str> for Id<T> {
    fn from(id: &str) -> Self {
        Id::new(id)
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let full_name = std::any::type_name::<T>();
        let clean_name = full_name.split("::").last().unwrap_or(full_name);
        let display_name = clean_name.replace("Tag", "Id");

        write!(f, "{}: {:?}", display_name, self.id)
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Copy)]
pub struct ApplicationTag;
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Copy)]
pub struct WorkerTag;

pub type ApplicationId = Id<ApplicationTag>;
pub type WorkerId = Id<WorkerTag>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_names_the_tag() {
        let worker = WorkerId::new("container_01");
        assert_eq!(format!("{:?}", worker), "WorkerId: \"container_01\"");
        assert_eq!(worker.to_string(), "container_01");
    }

    #[test]
    fn serializes_as_plain_string() {
        let app = ApplicationId::new("job-42");
        let bytes = bincode::serialize(&app).unwrap();
        assert_eq!(bytes, bincode::serialize("job-42").unwrap());

        let back: ApplicationId = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, app);
    }
}
