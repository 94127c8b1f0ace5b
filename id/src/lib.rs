// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Typed identifiers.
//!
//! Service chains, forwarders and service functions are all identified by [UUID]s somewhere in
//! the controller. This crate tags those [UUID]s with the type of object they name, so that a
//! chain identity can never be handed to an API expecting a forwarder identity.
//!
//! [UUID]: https://en.wikipedia.org/wiki/Universally_unique_identifier

#![deny(clippy::all, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use core::fmt::{Debug, Formatter};
use std::cmp::Ordering;
use std::fmt::Display;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use uuid::Uuid;

#[allow(unused_imports)] // re-export
#[cfg(any(test, feature = "bolero"))]
pub use contract::*;

/// A [`Uuid`] tagged at compile time with the type `T` it identifies.
///
/// # Example
///
/// ```
/// # use sfc_id::Id;
/// pub struct Chain {
///     id: Id<Self>,
///     hops: Vec<Id<Forwarder>>,
/// }
///
/// pub struct Forwarder {
///     id: Id<Self>,
///     name: String,
/// }
/// ```
///
/// Mixing up identities is a compile error:
///
/// ```rust,compile_fail
/// # use sfc_id::Id;
/// # struct Chain;
/// # struct Forwarder;
/// fn mixup(mut chain: Id<Chain>, forwarder: Id<Forwarder>) {
///     chain = forwarder;
/// }
/// ```
///
/// The tag is a [`PhantomData`]: it takes no space and costs nothing at runtime.
/// Something other than [`Uuid`] may be wrapped by supplying the second type parameter.
#[cfg_attr(feature = "serde", allow(clippy::unsafe_derive_deserialize))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[repr(transparent)]
pub struct Id<T: ?Sized, U = Uuid>(U, PhantomData<T>);

impl<T: ?Sized, U> Copy for Id<T, U> where U: Copy {}

impl<T: ?Sized, U> Clone for Id<T, U>
where
    U: Clone,
{
    fn clone(&self) -> Self {
        Self(self.0.clone(), PhantomData)
    }
}

impl<T: ?Sized, U> Hash for Id<T, U>
where
    U: Hash,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<T: ?Sized, U> PartialEq for Id<T, U>
where
    U: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T: ?Sized, U> Eq for Id<T, U> where U: Eq {}

impl<T: ?Sized, U> PartialOrd for Id<T, U>
where
    U: Ord,
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: ?Sized, U> Ord for Id<T, U>
where
    U: Ord,
{
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl<T: ?Sized, U> AsRef<U> for Id<T, U> {
    fn as_ref(&self) -> &U {
        &self.0
    }
}

impl<T: ?Sized, U> Display for Id<T, U>
where
    U: Display,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        <_ as Display>::fmt(&self.0, f)
    }
}

impl<T: ?Sized, U> Debug for Id<T, U>
where
    U: Debug,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        <_ as Debug>::fmt(&self.0, f)
    }
}

impl<T: ?Sized> Id<T> {
    /// Namespace for name-based ([UUIDv5]) identities generated by [`Id::from_name`].
    ///
    /// [UUIDv5]: https://datatracker.ietf.org/doc/html/rfc9562#section-5.5
    pub const NAMESPACE_UUID: Uuid = Uuid::from_u128(0x5fc0_7a1e_0b3d_4c6e_9a21_77e4_c0de_5fc0);

    /// Generate a fresh, random identity.
    #[must_use]
    #[allow(clippy::new_without_default)]
    pub fn new() -> Id<T> {
        Id(Uuid::new_v4(), PhantomData)
    }

    /// Strip the type tag and return the wrapped [`Uuid`].
    #[must_use]
    pub const fn into_raw(self) -> Uuid {
        self.0
    }

    /// Borrow the wrapped [`Uuid`].
    #[must_use]
    pub const fn as_raw(&self) -> &Uuid {
        &self.0
    }

    /// Tag a [`Uuid`] received from elsewhere (a northbound request, a data store record) with
    /// the type it is known to identify.
    ///
    /// Do not use this to convert an `Id<A>` into an `Id<B>`.
    #[must_use]
    pub const fn from_raw(uuid: Uuid) -> Self {
        Self(uuid, PhantomData)
    }

    /// Derive a stable identity from a name, e.g. a chain or forwarder name configured by an
    /// operator. The same name always maps to the same identity.
    #[must_use]
    pub fn from_name(name: impl AsRef<str>) -> Self {
        Self(
            Uuid::new_v5(&Self::NAMESPACE_UUID, name.as_ref().as_bytes()),
            PhantomData,
        )
    }
}

impl<T: ?Sized> From<Id<T>> for Uuid {
    fn from(value: Id<T>) -> Self {
        value.0
    }
}

impl<T: ?Sized> From<Uuid> for Id<T> {
    /// See [`Id::from_raw`].
    fn from(value: Uuid) -> Self {
        Self(value, PhantomData)
    }
}

#[cfg(any(test, feature = "bolero"))]
mod contract {
    use crate::Id;
    use bolero::{Driver, TypeGenerator};
    use std::marker::PhantomData;

    impl<T: ?Sized + 'static> TypeGenerator for Id<T> {
        fn generate<D: Driver>(driver: &mut D) -> Option<Self> {
            Some(Id(
                uuid::Builder::from_random_bytes(driver.produce::<[u8; 16]>()?).into_uuid(),
                PhantomData,
            ))
        }
    }
}

#[cfg(test)]
mod test {
    use crate::Id;
    use uuid::Uuid;

    enum Chain {}

    #[test]
    fn new_generates_unique() {
        bolero::check!().with_type().for_each(|x: &Id<Chain>| {
            assert_ne!(*x, Id::<Chain>::new());
        });
    }

    #[test]
    fn from_name_is_stable() {
        bolero::check!().with_type().for_each(|name: &String| {
            let id = Id::<Chain>::from_name(name.as_str());
            assert_eq!(id, Id::<Chain>::from_name(name.as_str()));
            let reference = Uuid::new_v5(&Id::<Chain>::NAMESPACE_UUID, name.as_bytes());
            assert_eq!(id.into_raw(), reference);
        });
    }

    #[test]
    fn raw_round_trip() {
        let uuid = Uuid::new_v4();
        let id = Id::<Chain>::from_raw(uuid);
        assert_eq!(id.as_raw(), &uuid);
        assert_eq!(Uuid::from(id), uuid);
        assert_eq!(id.to_string(), uuid.to_string());
    }
}
