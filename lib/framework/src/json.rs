use std::fmt::Debug;
use std::fs::read_to_string;
use std::path::Path;

use serde::Serialize;
use serde::de::Deserialize;
use serde::de::DeserializeOwned;

use crate::exception::CoreRsResult;

pub fn load_file<T>(path: &Path) -> CoreRsResult<T>
where
    T: DeserializeOwned,
{
    let json = read_to_string(path).map_err(|err| {
        exception!(
            message = format!("failed to read file, path={}", path.to_string_lossy()),
            source = err
        )
    })?;
    // config files may carry secrets, keep the content out of the error message
    serde_json::from_str(&json).map_err(|err| {
        exception!(
            message = format!("failed to deserialize file, path={}", path.to_string_lossy()),
            source = err
        )
    })
}

pub fn from_json<'a, T>(json: &'a str) -> CoreRsResult<T>
where
    T: Deserialize<'a>,
{
    serde_json::from_str(json)
        .map_err(|err| exception!(message = format!("failed to deserialize, json={json}"), source = err))
}

pub fn to_json<T>(object: &T) -> CoreRsResult<String>
where
    T: Serialize + Debug,
{
    serde_json::to_string(object).map_err(|err| {
        exception!(
            message = format!("failed to serialize, object={object:?}"),
            source = err
        )
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde::Deserialize;
    use serde::Serialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Parent {
        id: String,
    }

    #[test]
    fn to_json() {
        let json = super::to_json(&Parent { id: "0".to_owned() }).unwrap();
        assert_eq!(json, r#"{"id":"0"}"#);
    }

    #[test]
    fn from_json() {
        let parent: Parent = super::from_json(r#"{"id":"12"}"#).unwrap();
        assert_eq!(parent.id, "12");

        let result: Result<Parent, _> = super::from_json("{");
        assert!(result.is_err());
    }

    #[test]
    fn load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"id":"7"}}"#).unwrap();
        let parent: Parent = super::load_file(file.path()).unwrap();
        assert_eq!(parent, Parent { id: "7".to_owned() });
    }
}
