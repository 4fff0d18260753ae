//! Macros for naming states, intents and actions.

/// Implement [`State`](crate::core::State), [`Intent`](crate::core::Intent)
/// or [`Action`](crate::core::Action) for an enum by naming each variant
/// after itself.
///
/// Variants may carry data; only the variant name is used. States can
/// additionally list their error variants.
///
/// # Example
///
/// ```
/// use knot::named_variants;
/// use knot::core::{Intent, State};
///
/// #[derive(Clone, PartialEq, Debug)]
/// pub enum Download {
///     Idle,
///     Running { progress: u8 },
///     Failed(String),
/// }
///
/// named_variants! {
///     State for Download { Idle, Running, Failed }
///     error: [Failed]
/// }
///
/// #[derive(Debug)]
/// pub enum DownloadIntent {
///     Begin,
///     Progress(u8),
/// }
///
/// named_variants! {
///     Intent for DownloadIntent { Begin, Progress }
/// }
///
/// assert_eq!(Download::Running { progress: 3 }.name(), "Running");
/// assert!(Download::Failed("timeout".into()).is_error());
/// assert_eq!(DownloadIntent::Progress(50).name(), "Progress");
/// ```
#[macro_export]
macro_rules! named_variants {
    (
        $trait:ident for $name:ty {
            $($variant:ident),* $(,)?
        }
        $(error: [$($error:ident),+ $(,)?])?
    ) => {
        impl $crate::core::$trait for $name {
            fn name(&self) -> &str {
                match self {
                    $(Self::$variant { .. } => stringify!($variant)),*
                }
            }

            $(
                fn is_error(&self) -> bool {
                    matches!(self, $(Self::$error { .. })|+)
                }
            )?
        }
    };
}
