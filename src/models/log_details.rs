use diesel::deserialize::{FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::serialize;
use diesel::serialize::{IsNull, Output, ToSql};
use diesel::sql_types::Text;
use diesel::sqlite::{Sqlite, SqliteValue};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form context attached to an activity log entry, stored as JSON text
///
/// Always a JSON object. Anything else is wrapped under a `"value"` key so
/// readers can index entries by field name without checking the shape first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(transparent)]
pub struct LogDetails(Map<String, Value>);

impl LogDetails {
    /// Looks up one field, returning `Value::Null` when it is absent
    pub fn get(&self, key: &str) -> &Value {
        self.0.get(key).unwrap_or(&Value::Null)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Value> for LogDetails {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => LogDetails(map),
            Value::Null => LogDetails(Map::new()),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                LogDetails(map)
            }
        }
    }
}

impl FromSql<Text, Sqlite> for LogDetails {
    fn from_sql(value: SqliteValue<'_, '_, '_>) -> diesel::deserialize::Result<Self> {
        let text = <String as FromSql<Text, Sqlite>>::from_sql(value)?;
        let value: Value = serde_json::from_str(&text)?;
        Ok(LogDetails::from(value))
    }
}

impl ToSql<Text, Sqlite> for LogDetails {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        out.set_value(serde_json::to_string(&self.0)?);
        Ok(IsNull::No)
    }
}
