// crates/pmc-rs/src/schema/macros.rs
//! Declaration macros for node kinds.

/// Declares one node kind: a struct whose fields are its attributes, each
/// followed by `=> meta(...)`. Generates the descriptor table and dynamic
/// get/set used by serialization, columns, checks and exporters.
macro_rules! node_kind {
    (
        $(#[$smeta:meta])*
        pub struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $field:ident : $ty:ty => $attr:expr
            ),* $(,)?
        }
    ) => {
        $(#[$smeta])*
        #[derive(Debug, Clone, PartialEq, Default)]
        pub struct $name {
            $( $(#[$fmeta])* pub $field: $ty, )*
        }

        impl $crate::schema::Attributes for $name {
            const DESCRIPTORS: &'static [$crate::schema::AttrDescriptor] = &[
                $(
                    $crate::schema::AttrDescriptor::new(
                        stringify!($field),
                        <$ty as $crate::schema::AttrField>::TYPE,
                        $attr,
                    ),
                )*
            ];

            #[allow(clippy::match_single_binding)]
            fn get(&self, name: &str) -> Option<$crate::schema::AttrValue> {
                match name {
                    $( stringify!($field) => Some($crate::schema::AttrField::to_value(&self.$field)), )*
                    _ => None,
                }
            }

            #[allow(clippy::match_single_binding)]
            fn set(
                &mut self,
                name: &str,
                value: $crate::schema::AttrValue,
            ) -> Result<(), $crate::schema::AttrError> {
                match name {
                    $(
                        stringify!($field) => {
                            self.$field = <$ty as $crate::schema::AttrField>::from_value(value)
                                .ok_or_else(|| $crate::schema::AttrError::TypeMismatch {
                                    name: name.to_string(),
                                    expected: <$ty as $crate::schema::AttrField>::TYPE.name(),
                                })?;
                            Ok(())
                        }
                    )*
                    _ => {
                        drop(value);
                        Err($crate::schema::AttrError::UnknownAttribute {
                            kind: stringify!($name),
                            name: name.to_string(),
                        })
                    }
                }
            }
        }
    };
}

/// Declares a closed set of names persisted as strings.
macro_rules! choice_attr {
    (
        $(#[$emeta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$emeta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl $name {
            pub const NAMES: &'static [&'static str] = &[$($text),+];
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $text, )+
                }
            }

            pub fn from_name(text: &str) -> Option<Self> {
                match text {
                    $( $text => Some($name::$variant), )+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $crate::schema::AttrField for $name {
            const TYPE: $crate::schema::AttrType =
                $crate::schema::AttrType::plain($crate::schema::BaseType::Choice($name::NAMES));

            fn to_value(&self) -> $crate::schema::AttrValue {
                $crate::schema::AttrValue::String(self.as_str().to_string())
            }

            fn from_value(value: $crate::schema::AttrValue) -> Option<Self> {
                value.as_str().and_then($name::from_name)
            }
        }
    };
}

/// Declares every node kind of every tree: generates `NodeKind` (tags, owning
/// tree, descriptors) and the `NodeData` variant union.
macro_rules! node_registry {
    (
        $(
            $tree:ident {
                $( $variant:ident ( $ty:ty ) = $tag:literal ),* $(,)?
            }
        )*
    ) => {
        /// Discriminator of a node; persisted as `_type`.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum NodeKind {
            $( $( $variant, )* )*
        }

        /// Attribute payload of a node.
        #[derive(Debug, Clone, PartialEq)]
        pub enum NodeData {
            $( $( $variant($ty), )* )*
        }

        impl NodeKind {
            pub const ALL: &'static [NodeKind] = &[ $( $( NodeKind::$variant, )* )* ];

            /// The `_type` tag.
            pub fn tag(self) -> &'static str {
                match self {
                    $( $( NodeKind::$variant => $tag, )* )*
                }
            }

            pub fn from_tag(tag: &str) -> Option<Self> {
                match tag {
                    $( $( $tag => Some(NodeKind::$variant), )* )*
                    _ => None,
                }
            }

            pub fn tree(self) -> TreeKind {
                match self {
                    $( $( NodeKind::$variant => TreeKind::$tree, )* )*
                }
            }

            pub fn descriptors(self) -> &'static [$crate::schema::AttrDescriptor] {
                match self {
                    $( $( NodeKind::$variant =>
                        <$ty as $crate::schema::Attributes>::DESCRIPTORS, )* )*
                }
            }

            pub fn default_data(self) -> NodeData {
                match self {
                    $( $( NodeKind::$variant => NodeData::$variant(<$ty>::default()), )* )*
                }
            }
        }

        impl NodeData {
            pub fn kind(&self) -> NodeKind {
                match self {
                    $( $( NodeData::$variant(_) => NodeKind::$variant, )* )*
                }
            }

            pub fn get(&self, name: &str) -> Option<$crate::schema::AttrValue> {
                match self {
                    $( $( NodeData::$variant(d) => $crate::schema::Attributes::get(d, name), )* )*
                }
            }

            pub fn set(
                &mut self,
                name: &str,
                value: $crate::schema::AttrValue,
            ) -> Result<(), $crate::schema::AttrError> {
                match self {
                    $( $( NodeData::$variant(d) => $crate::schema::Attributes::set(d, name, value), )* )*
                }
            }
        }

        $( $(
            impl KindData for $ty {
                const KIND: NodeKind = NodeKind::$variant;

                fn from_data(data: &NodeData) -> Option<&Self> {
                    match data {
                        NodeData::$variant(d) => Some(d),
                        _ => None,
                    }
                }

                fn from_data_mut(data: &mut NodeData) -> Option<&mut Self> {
                    match data {
                        NodeData::$variant(d) => Some(d),
                        _ => None,
                    }
                }

                fn into_data(self) -> NodeData {
                    NodeData::$variant(self)
                }
            }

            impl From<$ty> for NodeData {
                fn from(value: $ty) -> Self {
                    NodeData::$variant(value)
                }
            }
        )* )*
    };
}
