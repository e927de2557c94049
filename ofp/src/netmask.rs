// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Conversions between OpenFlow wildcard bit counts and CIDR netmasks.
//!
//! The wire format counts *wildcarded* (trailing) bits: 0 is an exact match, 1 ignores the least
//! significant bit, and 32 or more wildcards the entire address.
//! This is the opposite of the usual `/24` prefix length convention.

/// Returns true iff `netmask` is a CIDR netmask: some number of leading ones followed only by
/// zeros.
#[must_use]
pub const fn is_cidr(netmask: u32) -> bool {
    let inverted = !netmask;
    inverted & inverted.wrapping_add(1) == 0
}

/// Convert the wildcard bit count held in the low 6 bits of `wcbits` into a netmask with a one in
/// every bit which must match.
///
/// Counts of 32 and above yield an all-zero (fully wildcarded) mask.
#[must_use]
pub const fn wcbits_to_netmask(wcbits: u32) -> u32 {
    let wcbits = wcbits & 0x3f;
    if wcbits < 32 {
        !((1u32 << wcbits) - 1)
    } else {
        0
    }
}

/// Convert a netmask back into the number of address bits it wildcards.
///
/// # Panics
///
/// Panics if `netmask` is not a CIDR netmask.
/// Only masks produced by [`wcbits_to_netmask`] ever reach this function.
#[must_use]
pub const fn netmask_to_wcbits(netmask: u32) -> u32 {
    assert!(is_cidr(netmask), "netmask is not a CIDR mask");
    netmask.trailing_zeros()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn known_masks() {
        assert_eq!(wcbits_to_netmask(0), 0xffff_ffff);
        assert_eq!(wcbits_to_netmask(8), 0xffff_ff00);
        assert_eq!(wcbits_to_netmask(31), 0x8000_0000);
        assert_eq!(wcbits_to_netmask(32), 0);
        assert_eq!(wcbits_to_netmask(63), 0);
        // only the low six bits are considered
        assert_eq!(wcbits_to_netmask(64 + 8), 0xffff_ff00);
    }

    #[test]
    fn zero_mask_wildcards_everything() {
        assert_eq!(netmask_to_wcbits(0), 32);
    }

    #[test]
    fn counts_round_trip() {
        for n in 0..=32 {
            assert_eq!(netmask_to_wcbits(wcbits_to_netmask(n)), n);
        }
        for n in 33..64 {
            assert_eq!(wcbits_to_netmask(n), 0);
        }
    }

    #[test]
    fn produced_masks_are_cidr() {
        bolero::check!().with_type().for_each(|n: &u32| {
            assert!(is_cidr(wcbits_to_netmask(*n)));
        });
    }

    #[test]
    fn non_cidr_masks_are_detected() {
        assert!(!is_cidr(0x00ff_ff00));
        assert!(!is_cidr(0xffff_00ff));
        assert!(!is_cidr(1));
        assert!(is_cidr(0xffff_ffff));
    }

    #[test]
    #[should_panic(expected = "not a CIDR")]
    fn non_cidr_mask_is_a_programming_error() {
        let _ = netmask_to_wcbits(0x0f0f_0f0f);
    }
}
