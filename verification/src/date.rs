//! Calendar helpers for proof dates (UTC, two-digit years in the 2000s).

use stakepgp_types::{FieldElement, Timestamp};

use crate::VerificationError;

pub const DAY_SECS: u64 = 86_400;

/// Days since 1970-01-01 for a proleptic Gregorian date.
pub fn days_from_civil(year: i64, month: u32, day: u32) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = (if y >= 0 { y } else { y - 399 }) / 400;
    let yoe = y - era * 400;
    let m = month as i64;
    let mp = if m > 2 { m - 3 } else { m + 9 };
    let doy = (153 * mp + 2) / 5 + day as i64 - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

fn days_in_month(year: i64, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if (year % 4 == 0 && year % 100 != 0) || year % 400 == 0 => 29,
        2 => 28,
        _ => 0,
    }
}

/// Midnight UTC of the `YYMMDD` date carried as six single-digit signals.
pub fn proof_date_to_timestamp(digits: &[FieldElement]) -> Result<Timestamp, VerificationError> {
    if digits.len() != 6 {
        return Err(VerificationError::InvalidDateLength);
    }
    let mut d = [0u32; 6];
    for (slot, signal) in d.iter_mut().zip(digits) {
        match signal.to_u64() {
            Some(v) if v <= 9 => *slot = v as u32,
            _ => return Err(VerificationError::CurrentDateNotInValidRange),
        }
    }
    let year = 2000 + (d[0] * 10 + d[1]) as i64;
    let month = d[2] * 10 + d[3];
    let day = d[4] * 10 + d[5];
    if day == 0 || day > days_in_month(year, month) {
        return Err(VerificationError::CurrentDateNotInValidRange);
    }
    let days = days_from_civil(year, month, day);
    Ok(Timestamp::new(days as u64 * DAY_SECS))
}

/// The proof date must fall on yesterday, today or tomorrow (UTC) so that
/// proofs generated in another timezone are accepted.
pub fn check_current_date(digits: &[FieldElement], now: Timestamp) -> Result<(), VerificationError> {
    let proof_day = proof_date_to_timestamp(digits)?.as_secs();
    let today = now.as_secs() - now.as_secs() % DAY_SECS;
    if proof_day + DAY_SECS < today || proof_day > today + DAY_SECS {
        return Err(VerificationError::CurrentDateNotInValidRange);
    }
    Ok(())
}

/// Six ASCII digits `YYMMDD` rendered as `DD-MM-YY`.
pub fn format_mrz_date(raw: &[u8]) -> Result<String, VerificationError> {
    if raw.len() != 6 {
        return Err(VerificationError::InvalidDateLength);
    }
    if let Some(bad) = raw.iter().find(|b| !b.is_ascii_digit()) {
        return Err(VerificationError::InvalidAsciiCode(*bad));
    }
    let s = |i: usize| raw[i] as char;
    Ok(format!(
        "{}{}-{}{}-{}{}",
        s(4),
        s(5),
        s(2),
        s(3),
        s(0),
        s(1)
    ))
}

/// Signals for `YYMMDD`, as a prover would emit them for `now`.
pub fn date_signals(now: Timestamp) -> [FieldElement; 6] {
    let (year, month, day) = civil_from_days((now.as_secs() / DAY_SECS) as i64);
    let yy = year.rem_euclid(100) as u64;
    [
        yy / 10,
        yy % 10,
        (month / 10) as u64,
        (month % 10) as u64,
        (day / 10) as u64,
        (day % 10) as u64,
    ]
    .map(FieldElement::from_u64)
}

/// Inverse of [`days_from_civil`].
pub fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = (if z >= 0 { z } else { z - 146_096 }) / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    (if m <= 2 { y + 1 } else { y }, m, d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // 2024-03-15 00:00:00 UTC
    const MARCH_15_2024: u64 = 1_710_460_800;

    #[test]
    fn known_dates() {
        assert_eq!(days_from_civil(1970, 1, 1), 0);
        assert_eq!(days_from_civil(2024, 3, 15) as u64 * DAY_SECS, MARCH_15_2024);
        assert_eq!(civil_from_days(0), (1970, 1, 1));
    }

    #[test]
    fn signals_for_today_are_accepted() {
        let now = Timestamp::new(MARCH_15_2024 + 3_600);
        let signals = date_signals(now);
        assert_eq!(signals[0], FieldElement::from_u64(2));
        assert_eq!(signals[1], FieldElement::from_u64(4));
        assert_eq!(signals[3], FieldElement::from_u64(3));
        assert_eq!(signals[5], FieldElement::from_u64(5));
        check_current_date(&signals, now).unwrap();
    }

    #[test]
    fn one_day_either_side_is_accepted() {
        let now = Timestamp::new(MARCH_15_2024 + 3_600);
        let yesterday = date_signals(Timestamp::new(MARCH_15_2024 - DAY_SECS));
        let tomorrow = date_signals(Timestamp::new(MARCH_15_2024 + DAY_SECS));
        check_current_date(&yesterday, now).unwrap();
        check_current_date(&tomorrow, now).unwrap();

        let stale = date_signals(Timestamp::new(MARCH_15_2024 - 2 * DAY_SECS));
        assert_eq!(
            check_current_date(&stale, now),
            Err(VerificationError::CurrentDateNotInValidRange)
        );
    }

    #[test]
    fn impossible_dates_are_rejected() {
        // 24-02-30
        let digits = [2, 4, 0, 2, 3, 0].map(FieldElement::from_u64);
        assert_eq!(
            proof_date_to_timestamp(&digits),
            Err(VerificationError::CurrentDateNotInValidRange)
        );
        let digits = [2, 4, 1, 3, 0, 1].map(FieldElement::from_u64);
        assert!(proof_date_to_timestamp(&digits).is_err());
    }

    #[test]
    fn mrz_dates_are_reordered() {
        assert_eq!(format_mrz_date(b"900131").unwrap(), "31-01-90");
        assert_eq!(format_mrz_date(b"9001"), Err(VerificationError::InvalidDateLength));
        assert_eq!(
            format_mrz_date(b"90O131"),
            Err(VerificationError::InvalidAsciiCode(b'O'))
        );
    }

    proptest! {
        #[test]
        fn civil_roundtrip(days in 0i64..60_000) {
            let (y, m, d) = civil_from_days(days);
            prop_assert_eq!(days_from_civil(y, m, d), days);
        }
    }
}
