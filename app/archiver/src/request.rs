use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

use chrono::TimeDelta;

// roughly 6000 years, a missing or broken minagedays must archive nothing
const DEFAULT_MIN_AGE_DAYS: i64 = 365 * 6000;

/// Request parameters from query string and url-encoded form body, the first value of a name wins.
#[derive(Debug, Default)]
pub struct Params {
    values: HashMap<String, String>,
}

impl Params {
    pub fn parse(query: Option<&str>, form: Option<&str>) -> Self {
        let mut values = HashMap::new();
        for source in [query, form].into_iter().flatten() {
            for (name, value) in url::form_urlencoded::parse(source.as_bytes()) {
                values.entry(name.into_owned()).or_insert_with(|| value.into_owned());
            }
        }
        Params { values }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

#[derive(Debug)]
pub struct ArchivalRequest {
    pub directory: PathBuf,
    pub min_age: TimeDelta,
    pub preserve: bool,
}

impl ArchivalRequest {
    pub fn new(directory: &Path, params: &Params) -> Self {
        ArchivalRequest {
            directory: directory.to_path_buf(),
            min_age: min_age(params.get("minagedays")),
            preserve: preserve(params.get("preserve")),
        }
    }
}

fn min_age(value: Option<&str>) -> TimeDelta {
    value
        .and_then(|value| value.parse::<i64>().ok())
        .and_then(TimeDelta::try_days)
        .or_else(|| TimeDelta::try_days(DEFAULT_MIN_AGE_DAYS))
        .unwrap_or(TimeDelta::MAX)
}

fn preserve(value: Option<&str>) -> bool {
    value.is_some_and(|value| value.eq_ignore_ascii_case("true"))
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use chrono::TimeDelta;

    use super::ArchivalRequest;
    use super::Params;

    #[test]
    fn parse() {
        let params = Params::parse(Some("minagedays=5&preserve=true&minagedays=9"), Some("preserve=false&code=x"));
        assert_eq!(params.get("minagedays"), Some("5"));
        assert_eq!(params.get("preserve"), Some("true"));
        assert_eq!(params.get("code"), Some("x"));
        assert_eq!(params.get("state"), None);

        let params = Params::parse(Some("name=a%20b+c"), None);
        assert_eq!(params.get("name"), Some("a b c"));
    }

    #[test]
    fn min_age() {
        assert_eq!(super::min_age(Some("5")), TimeDelta::days(5));
        assert_eq!(super::min_age(Some("-1")), TimeDelta::days(-1));
        assert_eq!(super::min_age(None), TimeDelta::days(365 * 6000));
        assert_eq!(super::min_age(Some("five")), TimeDelta::days(365 * 6000));
        assert_eq!(super::min_age(Some("")), TimeDelta::days(365 * 6000));
        assert_eq!(super::min_age(Some("9223372036854775807")), TimeDelta::days(365 * 6000));
    }

    #[test]
    fn preserve() {
        assert!(super::preserve(Some("true")));
        assert!(super::preserve(Some("TRUE")));
        assert!(!super::preserve(Some("yes")));
        assert!(!super::preserve(Some("")));
        assert!(!super::preserve(None));
    }

    #[test]
    fn archival_request() {
        let params = Params::parse(Some("minagedays=5"), None);
        let request = ArchivalRequest::new(Path::new("/data"), &params);
        assert_eq!(request.directory, Path::new("/data"));
        assert_eq!(request.min_age, TimeDelta::days(5));
        assert!(!request.preserve);
    }
}
