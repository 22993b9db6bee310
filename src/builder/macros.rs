//! Macros for declaring simple state enums.

/// Declare a fieldless enum and implement `State` for it.
///
/// The enum also gets an inherent `all()` listing every variant, which is
/// handy for finite state spaces.
///
/// # Example
///
/// ```
/// use tenet::state_enum;
/// use tenet::core::State;
/// use tenet::kind::StateSpace;
///
/// state_enum! {
///     pub enum Channel {
///         Idle,
///         Sending,
///         Closed,
///     }
/// }
///
/// assert_eq!(Channel::Sending.name(), "Sending");
/// let space = StateSpace::finite(Channel::all());
/// assert!(space.contains(&Channel::Closed));
/// ```
#[macro_export]
macro_rules! state_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $name {
            /// Every variant, in declaration order.
            #[allow(dead_code)]
            pub fn all() -> Vec<Self> {
                vec![$(Self::$variant),*]
            }
        }

        impl $crate::core::State for $name {
            fn name(&self) -> &str {
                match self {
                    $(Self::$variant => stringify!($variant)),*
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::core::State;

    state_enum! {
        enum TestState {
            Closed,
            ReadOpen,
            WriteOpen,
        }
    }

    #[test]
    fn state_enum_macro_generates_trait() {
        assert_eq!(TestState::Closed.name(), "Closed");
        assert_eq!(TestState::WriteOpen.name(), "WriteOpen");
    }

    #[test]
    fn all_lists_variants_in_order() {
        assert_eq!(
            TestState::all(),
            vec![TestState::Closed, TestState::ReadOpen, TestState::WriteOpen]
        );
    }

    #[test]
    fn state_enum_supports_visibility() {
        state_enum! {
            pub enum PublicState {
                A,
                B,
            }
        }

        assert_eq!(PublicState::all().len(), 2);
    }
}
