//! Parameter codec — the flat `key=value;key=value` grammar used by level data.

use rustc_hash::FxHashMap;

use crate::schema::value::Value;

/// A parsed parameter string: keys mapped to coerced values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    values: FxHashMap<String, Value>,
}

impl Params {
    /// Parse a parameter string.
    ///
    /// Pairs are separated by `;` or line breaks. Each value is coerced in
    /// order: `true`/`false` (any case) → bool, then integer, then finite
    /// float, otherwise a string with `\n` escapes expanded. Pairs without
    /// `=` or with an empty key are dropped.
    pub fn parse(input: Option<&str>) -> Params {
        let mut values = FxHashMap::default();
        let Some(input) = input else {
            return Params { values };
        };

        for pair in input.split(|c| c == ';' || c == '\n') {
            let Some((key, raw)) = pair.split_once('=') else {
                continue;
            };
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            values.insert(key.to_string(), coerce(raw.trim()));
        }

        Params { values }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.values.get(key).and_then(Value::as_i64)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.values.get(key).and_then(Value::as_f64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.values.get(key).and_then(Value::as_bool)
    }

    /// The value rendered as text, whatever its coerced type. Level data
    /// writes ids and paths that may happen to look numeric.
    pub fn get_text(&self, key: &str) -> Option<String> {
        self.values.get(key).map(Value::to_string)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }
}

fn coerce(raw: &str) -> Value {
    if raw.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if let Ok(i) = raw.parse::<i64>() {
        return Value::Int(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        if f.is_finite() {
            return Value::Float(f);
        }
    }
    Value::String(raw.replace("\\n", "\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_integer_value() {
        let p = Params::parse(Some("flag=hp;value=10"));
        assert_eq!(p.len(), 2);
        assert_eq!(p.get("flag"), Some(&Value::from("hp")));
        assert!(matches!(p.get("value"), Some(Value::Int(10))));
    }

    #[test]
    fn parse_boolean_value() {
        let p = Params::parse(Some("flag=x;value=true"));
        assert_eq!(p.get_str("flag"), Some("x"));
        assert!(matches!(p.get("value"), Some(Value::Bool(true))));

        let p = Params::parse(Some("a=FALSE;b=True"));
        assert_eq!(p.get_bool("a"), Some(false));
        assert_eq!(p.get_bool("b"), Some(true));
    }

    #[test]
    fn parse_empty_and_absent() {
        assert!(Params::parse(Some("")).is_empty());
        assert!(Params::parse(None).is_empty());
    }

    #[test]
    fn newline_is_a_separator() {
        let p = Params::parse(Some("a=1\nb=2"));
        assert_eq!(p.len(), 2);
        assert_eq!(p.get_i64("a"), Some(1));
        assert_eq!(p.get_i64("b"), Some(2));
    }

    #[test]
    fn crlf_input() {
        let p = Params::parse(Some("text=hello\r\nflag=done"));
        assert_eq!(p.get_str("text"), Some("hello"));
        assert_eq!(p.get_str("flag"), Some("done"));
    }

    #[test]
    fn float_and_string_fallback() {
        let p = Params::parse(Some("time=1.5;zone=(5,2);speed=nan"));
        assert!(matches!(p.get("time"), Some(Value::Float(f)) if (*f - 1.5).abs() < f64::EPSILON));
        assert_eq!(p.get_str("zone"), Some("(5,2)"));
        assert_eq!(p.get_str("speed"), Some("nan"));
    }

    #[test]
    fn escaped_newline_in_strings() {
        let p = Params::parse(Some(r"text=Line one\nLine two"));
        assert_eq!(p.get_str("text"), Some("Line one\nLine two"));
    }

    #[test]
    fn malformed_pairs_dropped() {
        let p = Params::parse(Some("garbage;flag=x;;=5;  ;value"));
        assert_eq!(p.len(), 1);
        assert_eq!(p.get_str("flag"), Some("x"));
    }

    #[test]
    fn value_keeps_later_equals_signs() {
        let p = Params::parse(Some("text=a=b"));
        assert_eq!(p.get_str("text"), Some("a=b"));
    }

    #[test]
    fn keys_and_values_trimmed() {
        let p = Params::parse(Some("  flag = door_open ; value = 3 "));
        assert_eq!(p.get_str("flag"), Some("door_open"));
        assert_eq!(p.get_i64("value"), Some(3));
    }

    #[test]
    fn integer_widens_to_float() {
        let p = Params::parse(Some("volume=1"));
        assert_eq!(p.get_f64("volume"), Some(1.0));
        assert_eq!(p.get_text("volume").as_deref(), Some("1"));
    }
}
