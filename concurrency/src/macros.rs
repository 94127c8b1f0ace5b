// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

/// Keep the wrapped items only when the *concurrency* crate is built with `shuttle`.
///
/// The feature is evaluated for the *concurrency* crate, not for the crate invoking the macro,
/// so that tests of dependent crates follow whatever primitives [`sync`](crate::sync) exports.
///
/// # Example
/// ```
/// # use sfc_concurrency::with_shuttle;
/// with_shuttle! {
///     fn model_checked() {}
/// }
/// ```
#[cfg(feature = "shuttle")]
#[macro_export]
macro_rules! with_shuttle {
    ($($item:item)*) => {
        $(
            $item
        )*
    };
}

/// Keep the wrapped items only when the *concurrency* crate is built with `shuttle`.
#[cfg(not(feature = "shuttle"))]
#[macro_export]
macro_rules! with_shuttle {
    ($($item:item)*) => {};
}

/// Keep the wrapped items only when the *concurrency* crate uses plain `std` primitives.
///
/// # Example
/// ```
/// # use sfc_concurrency::with_std;
/// with_std! {
///     fn runs_on_os_threads() {}
/// }
/// ```
#[cfg(not(feature = "shuttle"))]
#[macro_export]
macro_rules! with_std {
    ($($item:item)*) => {
        $(
            $item
        )*
    };
}

/// Keep the wrapped items only when the *concurrency* crate uses plain `std` primitives.
#[cfg(feature = "shuttle")]
#[macro_export]
macro_rules! with_std {
    ($($item:item)*) => {};
}
