use diesel::deserialize::{FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use diesel::sqlite::{Sqlite, SqliteValue};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declares an enum that is stored in SQLite as lowercase text
///
/// Each variant is paired with its stored name. The same name is used for
/// JSON, `Display` and `FromStr`, so the API, the CLI and the database all
/// agree on one spelling.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow)]
        #[diesel(sql_type = Text)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The stored (and serialized) name of this variant
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $text => Ok($name::$variant), )+
                    other => Err(format!("Unknown {}: {}", stringify!($name), other)),
                }
            }
        }

        impl FromSql<Text, Sqlite> for $name {
            fn from_sql(value: SqliteValue<'_, '_, '_>) -> diesel::deserialize::Result<Self> {
                let text = <String as FromSql<Text, Sqlite>>::from_sql(value)?;
                text.parse::<$name>().map_err(Into::into)
            }
        }

        impl ToSql<Text, Sqlite> for $name {
            fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
                out.set_value(self.as_str());
                Ok(IsNull::No)
            }
        }
    };
}

text_enum! {
    /// Access level of a user account
    ///
    /// Roles are ordered: every role can do everything the roles below it can.
    pub enum Role {
        User => "user",
        Mechanic => "mechanic",
        Manager => "manager",
        Admin => "admin",
    }
}

impl Role {
    fn rank(&self) -> u8 {
        match self {
            Role::User => 0,
            Role::Mechanic => 1,
            Role::Manager => 2,
            Role::Admin => 3,
        }
    }

    /// Whether this role grants at least the privileges of `required`
    pub fn at_least(&self, required: Role) -> bool {
        self.rank() >= required.rank()
    }
}

text_enum! {
    /// Lifecycle state of an asset
    pub enum AssetStatus {
        Available => "available",
        CheckedOut => "checked_out",
        InMaintenance => "in_maintenance",
        Retired => "retired",
    }
}

text_enum! {
    /// Progress of a maintenance job
    pub enum MaintenanceStatus {
        Scheduled => "scheduled",
        InProgress => "in_progress",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

impl MaintenanceStatus {
    /// Completed and cancelled jobs cannot change any more
    pub fn is_terminal(&self) -> bool {
        matches!(self, MaintenanceStatus::Completed | MaintenanceStatus::Cancelled)
    }

    /// Whether a job may move from `self` to `next`
    pub fn can_transition_to(&self, next: MaintenanceStatus) -> bool {
        use MaintenanceStatus::*;
        matches!(
            (self, next),
            (Scheduled, InProgress) | (Scheduled, Cancelled) | (InProgress, Completed) | (InProgress, Cancelled)
        )
    }
}

text_enum! {
    /// What a notification is about
    pub enum NotificationKind {
        MaintenanceDue => "maintenance_due",
        OverdueCheckout => "overdue_checkout",
        LowStock => "low_stock",
        Info => "info",
    }
}
