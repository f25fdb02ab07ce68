use std::fmt;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

numeric_id!(
    /// Store-assigned identifier of a data container.
    ContainerId
);
numeric_id!(
    /// Store-assigned identifier of an imported item.
    ItemId
);
numeric_id!(
    /// Store-assigned identifier of an annotation.
    AnnotationId
);
numeric_id!(
    /// Identifier of the user an import or annotation is attributed to.
    UserId
);
numeric_id!(ProjectId);
