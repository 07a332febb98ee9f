//! Sub-field flag sets.
//!
//! Every delta type has its own flag newtype so that a mobj bit can never be
//! tested against a sector delta. The newtypes share one shape, generated by
//! [`delta_flags!`].

/// Declares a flag newtype over an unsigned integer.
macro_rules! delta_flags {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident($repr:ty) {
            $(
                $(#[$flag_meta:meta])*
                const $flag:ident = $value:expr;
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name($repr);

        impl $name {
            $(
                $(#[$flag_meta])*
                pub const $flag: Self = Self($value);
            )*

            /// No bits set.
            pub const EMPTY: Self = Self(0);

            /// Creates flags from a raw value.
            #[must_use]
            pub const fn from_raw(raw: $repr) -> Self {
                Self(raw)
            }

            /// Returns the raw flag bits.
            #[must_use]
            pub const fn raw(self) -> $repr {
                self.0
            }

            /// Returns `true` if no bits are set.
            #[must_use]
            pub const fn is_empty(self) -> bool {
                self.0 == 0
            }

            /// Returns `true` if every bit of `other` is set.
            #[must_use]
            pub const fn contains(self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }

            /// Returns `true` if any bit of `other` is set.
            #[must_use]
            pub const fn intersects(self, other: Self) -> bool {
                self.0 & other.0 != 0
            }

            /// Bits set in either.
            #[must_use]
            pub const fn union(self, other: Self) -> Self {
                Self(self.0 | other.0)
            }

            /// Bits set in both.
            #[must_use]
            pub const fn intersection(self, other: Self) -> Self {
                Self(self.0 & other.0)
            }

            /// Bits set in `self` but not in `other`.
            #[must_use]
            pub const fn difference(self, other: Self) -> Self {
                Self(self.0 & !other.0)
            }

            /// Sets every bit of `other`.
            pub fn insert(&mut self, other: Self) {
                self.0 |= other.0;
            }

            /// Clears every bit of `other`.
            pub fn remove(&mut self, other: Self) {
                self.0 &= !other.0;
            }

            /// Sets or clears every bit of `other`.
            pub fn set(&mut self, other: Self, on: bool) {
                if on {
                    self.insert(other);
                } else {
                    self.remove(other);
                }
            }
        }

        impl std::ops::BitOr for $name {
            type Output = Self;

            fn bitor(self, rhs: Self) -> Self {
                self.union(rhs)
            }
        }

        impl std::ops::BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: Self) {
                self.insert(rhs);
            }
        }
    };
}

pub(crate) use delta_flags;

#[cfg(test)]
mod tests {
    delta_flags! {
        struct TestFlags(u8) {
            const A = 0x01;
            const B = 0x02;
            const C = 0x04;
        }
    }

    #[test]
    fn insert_remove_contains() {
        let mut flags = TestFlags::EMPTY;
        assert!(flags.is_empty());

        flags.insert(TestFlags::A | TestFlags::C);
        assert!(flags.contains(TestFlags::A));
        assert!(!flags.contains(TestFlags::A | TestFlags::B));
        assert!(flags.intersects(TestFlags::A | TestFlags::B));

        flags.remove(TestFlags::A);
        assert_eq!(flags, TestFlags::C);
    }

    #[test]
    fn difference_and_set() {
        let all = TestFlags::A | TestFlags::B | TestFlags::C;
        assert_eq!(all.difference(TestFlags::B).raw(), 0x05);

        let mut flags = TestFlags::EMPTY;
        flags.set(TestFlags::B, true);
        assert_eq!(flags, TestFlags::B);
        flags.set(TestFlags::B, false);
        assert!(flags.is_empty());
    }

    #[test]
    fn raw_roundtrip() {
        assert_eq!(TestFlags::from_raw(0x06), TestFlags::B | TestFlags::C);
    }
}
