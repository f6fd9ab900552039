//! The demand lattice that governs how requests flow backward through a
//! gate network and how availability flows forward.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum_macros::{Display, EnumIter};

/// One of the five demand tags, totally ordered `Void < Avail < Notag < Req
/// < Reset`. The join of two tags (see [`Tag::join`]) is the greater one;
/// propagation uses this to merge requests arriving from multiple dependency
/// paths onto the same port.
#[repr(u8)]
#[derive(
    Copy, Clone, Eq, PartialEq, Hash, Debug, Display, EnumIter, IntoPrimitive, TryFromPrimitive,
)]
pub enum Tag {
    /// No value present on the port.
    Void = 0,
    /// A value is currently sitting on the port, waiting to be consumed.
    Avail = 1,
    /// Neutral: neither demand nor advertised availability.
    Notag = 2,
    /// Demand: the far side wants a value here.
    Req = 3,
    /// Reserved control token that clears downstream state.
    Reset = 4,
}

impl Tag {
    /// The monotone join over the lattice: "take the greater tag".
    #[inline(always)]
    pub fn join(self, other: Tag) -> Tag {
        if self as u8 >= other as u8 {
            self
        } else {
            other
        }
    }

    #[inline(always)]
    pub fn is_demand(self) -> bool {
        matches!(self, Tag::Req | Tag::Reset)
    }
}

impl Ord for Tag {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (*self as u8).cmp(&(*other as u8))
    }
}
impl PartialOrd for Tag {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Default for Tag {
    fn default() -> Self {
        Tag::Notag
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn total_order_matches_spec() {
        assert!(Tag::Void < Tag::Avail);
        assert!(Tag::Avail < Tag::Notag);
        assert!(Tag::Notag < Tag::Req);
        assert!(Tag::Req < Tag::Reset);
    }

    #[test]
    fn join_takes_the_greater_tag() {
        assert_eq!(Tag::Void.join(Tag::Req), Tag::Req);
        assert_eq!(Tag::Reset.join(Tag::Req), Tag::Reset);
        assert_eq!(Tag::Avail.join(Tag::Avail), Tag::Avail);
    }

    #[test]
    fn ordinal_round_trips_through_num_enum() {
        for tag in Tag::iter() {
            let ordinal: u8 = tag.into();
            assert_eq!(Tag::try_from_primitive(ordinal).unwrap(), tag);
        }
    }
}
