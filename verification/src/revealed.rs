//! Decoding of the passport data a proof discloses.
//!
//! The circuit packs the 93 MRZ-derived bytes little-endian, 31 bytes per
//! field element. Undisclosed bytes are zero.

use serde::{Deserialize, Serialize};
use stakepgp_types::FieldElement;

use crate::date::format_mrz_date;
use crate::VerificationError;

pub const REVEALED_DATA_BYTES: usize = 93;
const BYTES_PER_ELEMENT: usize = 31;

/// Most forbidden-country codes that fit in one packed element.
pub const MAX_FORBIDDEN_COUNTRIES: usize = 10;
const COUNTRY_CODE_LEN: usize = 3;

const ISSUING_STATE: (usize, usize) = (2, 4);
const NAME: (usize, usize) = (5, 43);
const PASSPORT_NUMBER: (usize, usize) = (44, 52);
const NATIONALITY: (usize, usize) = (54, 56);
const DATE_OF_BIRTH: (usize, usize) = (57, 62);
const GENDER: (usize, usize) = (64, 64);
const EXPIRY_DATE: (usize, usize) = (65, 70);
const OLDER_THAN: (usize, usize) = (88, 89);
const OFAC: usize = 90;

/// Which attribute to decode. Discriminants are the wire values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum RevealedDataType {
    IssuingState = 0,
    Name = 1,
    PassportNumber = 2,
    Nationality = 3,
    DateOfBirth = 4,
    Gender = 5,
    ExpiryDate = 6,
    OlderThan = 7,
    Ofac = 8,
}

impl TryFrom<u8> for RevealedDataType {
    type Error = VerificationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::IssuingState,
            1 => Self::Name,
            2 => Self::PassportNumber,
            3 => Self::Nationality,
            4 => Self::DateOfBirth,
            5 => Self::Gender,
            6 => Self::ExpiryDate,
            7 => Self::OlderThan,
            8 => Self::Ofac,
            other => return Err(VerificationError::InvalidRevealedDataType(other)),
        })
    }
}

/// Decoded disclosures. Attributes that were not requested stay empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadableRevealedData {
    pub issuing_state: String,
    /// `[given names, surname]` when requested.
    pub name: Vec<String>,
    pub passport_number: String,
    pub nationality: String,
    pub date_of_birth: String,
    pub gender: String,
    pub expiry_date: String,
    pub older_than: u32,
    pub ofac: u8,
}

/// Unpack the three revealed-data elements into their 93 bytes.
pub fn unpack_revealed_data(packed: &[FieldElement; 3]) -> [u8; REVEALED_DATA_BYTES] {
    let mut bytes = [0u8; REVEALED_DATA_BYTES];
    for (j, element) in packed.iter().enumerate() {
        for i in 0..BYTES_PER_ELEMENT {
            bytes[j * BYTES_PER_ELEMENT + i] = element.packed_byte(i);
        }
    }
    bytes
}

/// Pack 93 revealed bytes the way the circuit does.
pub fn pack_revealed_data(bytes: &[u8; REVEALED_DATA_BYTES]) -> [FieldElement; 3] {
    let chunk = |j: usize| {
        let mut be = [0u8; 32];
        for i in 0..BYTES_PER_ELEMENT {
            be[31 - i] = bytes[j * BYTES_PER_ELEMENT + i];
        }
        FieldElement::from_be_bytes(be)
    };
    [chunk(0), chunk(1), chunk(2)]
}

fn text(bytes: &[u8], (start, end): (usize, usize)) -> String {
    bytes[start..=end]
        .iter()
        .filter(|b| **b != 0)
        .map(|b| *b as char)
        .collect()
}

fn raw(bytes: &[u8], (start, end): (usize, usize)) -> Vec<u8> {
    bytes[start..=end].iter().copied().filter(|b| *b != 0).collect()
}

fn ascii_digit(b: u8) -> Result<u32, VerificationError> {
    if b.is_ascii_digit() {
        Ok((b - b'0') as u32)
    } else {
        Err(VerificationError::InvalidAsciiCode(b))
    }
}

/// Split an MRZ name field (`SURNAME<<GIVEN<NAMES<<<`) into
/// `[given names, surname]`, with single fillers read as spaces.
pub fn format_name(field: &str) -> Vec<String> {
    let (surname, given) = field.split_once("<<").unwrap_or((field, ""));
    let clean = |part: &str| {
        part.split('<')
            .filter(|w| !w.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    };
    let given = given.split("<<").next().unwrap_or("");
    vec![clean(given), clean(surname)]
}

/// The minimum age the proof attests, from two ASCII digits.
pub fn older_than(bytes: &[u8; REVEALED_DATA_BYTES]) -> Result<u32, VerificationError> {
    Ok(ascii_digit(bytes[OLDER_THAN.0])? * 10 + ascii_digit(bytes[OLDER_THAN.1])?)
}

/// The OFAC flag byte; `1` means the holder passed the sanctions check.
pub fn ofac(bytes: &[u8; REVEALED_DATA_BYTES]) -> u8 {
    bytes[OFAC]
}

/// Decode the requested attributes of a proof's revealed data.
pub fn readable_revealed_data(
    packed: &[FieldElement; 3],
    types: &[u8],
) -> Result<ReadableRevealedData, VerificationError> {
    let bytes = unpack_revealed_data(packed);
    let mut data = ReadableRevealedData::default();
    for t in types {
        match RevealedDataType::try_from(*t)? {
            RevealedDataType::IssuingState => data.issuing_state = text(&bytes, ISSUING_STATE),
            RevealedDataType::Name => data.name = format_name(&text(&bytes, NAME)),
            RevealedDataType::PassportNumber => {
                data.passport_number = text(&bytes, PASSPORT_NUMBER)
            }
            RevealedDataType::Nationality => data.nationality = text(&bytes, NATIONALITY),
            RevealedDataType::DateOfBirth => {
                data.date_of_birth = format_mrz_date(&raw(&bytes, DATE_OF_BIRTH))?
            }
            RevealedDataType::Gender => data.gender = text(&bytes, GENDER),
            RevealedDataType::ExpiryDate => {
                data.expiry_date = format_mrz_date(&raw(&bytes, EXPIRY_DATE))?
            }
            RevealedDataType::OlderThan => data.older_than = older_than(&bytes)?,
            RevealedDataType::Ofac => data.ofac = ofac(&bytes),
        }
    }
    Ok(data)
}

/// The ten three-letter codes packed in one element. Empty slots read as "".
pub fn readable_forbidden_countries(packed: &FieldElement) -> [String; MAX_FORBIDDEN_COUNTRIES] {
    std::array::from_fn(|slot| {
        (0..COUNTRY_CODE_LEN)
            .map(|k| packed.packed_byte(slot * COUNTRY_CODE_LEN + k))
            .filter(|b| *b != 0)
            .map(|b| b as char)
            .collect()
    })
}

/// Pack up to ten country codes into the element a proof must carry.
pub fn pack_forbidden_countries<S: AsRef<str>>(
    codes: &[S],
) -> Result<FieldElement, VerificationError> {
    if codes.len() > MAX_FORBIDDEN_COUNTRIES {
        return Err(VerificationError::InvalidForbiddenCountries);
    }
    let mut packed = Vec::with_capacity(codes.len() * COUNTRY_CODE_LEN);
    for code in codes {
        let code = code.as_ref().trim();
        if code.len() != COUNTRY_CODE_LEN || !code.is_ascii() {
            return Err(VerificationError::InsufficientCharcodeLen(code.to_string()));
        }
        packed.extend(code.to_ascii_uppercase().bytes());
    }
    FieldElement::from_packed_bytes(&packed).map_err(|_| VerificationError::InvalidForbiddenCountries)
}
