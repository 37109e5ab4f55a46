//! In-process Groth16 verification over BN254.
//!
//! Verifying keys are read in the snarkjs `verification_key.json` layout.
//! Proofs arrive in Solidity calldata order, where each G2 coordinate lists
//! its `c1` component before `c0`.

use std::fmt;
use std::path::Path;

use ark_bn254::{Bn254, Fq, Fq2, Fr, G1Affine, G2Affine};
use ark_ff::{BigInteger, PrimeField};
use ark_groth16::{Groth16, PreparedVerifyingKey, Proof, VerifyingKey};
use serde::Deserialize;
use stakepgp_types::FieldElement;

use crate::{CircuitVerifier, VerificationError};

type JsonG1 = [FieldElement; 3];
type JsonG2 = [[FieldElement; 2]; 3];

#[derive(Deserialize)]
struct VerifyingKeyJson {
    protocol: String,
    curve: String,
    #[serde(rename = "nPublic")]
    n_public: usize,
    vk_alpha_1: JsonG1,
    vk_beta_2: JsonG2,
    vk_gamma_2: JsonG2,
    vk_delta_2: JsonG2,
    #[serde(rename = "IC")]
    ic: Vec<JsonG1>,
}

fn invalid(reason: impl Into<String>) -> VerificationError {
    VerificationError::InvalidVerifyingKey(reason.into())
}

/// The base-field element with these big-endian bytes, if canonical.
fn to_fq(value: &FieldElement) -> Option<Fq> {
    let bytes = value.as_be_bytes();
    let fq = Fq::from_be_bytes_mod_order(bytes);
    (fq.into_bigint().to_bytes_be() == bytes.as_slice()).then_some(fq)
}

/// The scalar with these big-endian bytes, if canonical.
fn to_fr(value: &FieldElement) -> Option<Fr> {
    let bytes = value.as_be_bytes();
    let fr = Fr::from_be_bytes_mod_order(bytes);
    (fr.into_bigint().to_bytes_be() == bytes.as_slice()).then_some(fr)
}

fn g1(x: &FieldElement, y: &FieldElement) -> Option<G1Affine> {
    if x.is_zero() && y.is_zero() {
        return Some(G1Affine::identity());
    }
    let point = G1Affine::new_unchecked(to_fq(x)?, to_fq(y)?);
    (point.is_on_curve() && point.is_in_correct_subgroup_assuming_on_curve()).then_some(point)
}

fn g2(x: Fq2, y: Fq2) -> Option<G2Affine> {
    let point = G2Affine::new_unchecked(x, y);
    (point.is_on_curve() && point.is_in_correct_subgroup_assuming_on_curve()).then_some(point)
}

fn fq2(c0: &FieldElement, c1: &FieldElement) -> Option<Fq2> {
    Some(Fq2::new(to_fq(c0)?, to_fq(c1)?))
}

fn json_g1(point: &JsonG1, what: &str) -> Result<G1Affine, VerificationError> {
    if point[2].is_zero() {
        return Ok(G1Affine::identity());
    }
    g1(&point[0], &point[1]).ok_or_else(|| invalid(format!("{what} is not a G1 point")))
}

fn json_g2(point: &JsonG2, what: &str) -> Result<G2Affine, VerificationError> {
    let [x, y, _] = point;
    fq2(&x[0], &x[1])
        .zip(fq2(&y[0], &y[1]))
        .and_then(|(x, y)| g2(x, y))
        .ok_or_else(|| invalid(format!("{what} is not a G2 point")))
}

/// A [`CircuitVerifier`] holding one circuit's prepared verifying key.
pub struct Groth16Verifier {
    name: String,
    pvk: PreparedVerifyingKey<Bn254>,
    n_public: usize,
}

impl Groth16Verifier {
    /// Parse a snarkjs verifying key.
    pub fn from_json_str(name: impl Into<String>, json: &str) -> Result<Self, VerificationError> {
        let vk: VerifyingKeyJson =
            serde_json::from_str(json).map_err(|e| invalid(e.to_string()))?;
        if vk.protocol != "groth16" {
            return Err(invalid(format!("unsupported protocol {:?}", vk.protocol)));
        }
        if !matches!(vk.curve.as_str(), "bn128" | "bn254") {
            return Err(invalid(format!("unsupported curve {:?}", vk.curve)));
        }
        if vk.ic.len() != vk.n_public + 1 {
            return Err(invalid(format!(
                "{} IC points for {} public signals",
                vk.ic.len(),
                vk.n_public
            )));
        }

        let key = VerifyingKey::<Bn254> {
            alpha_g1: json_g1(&vk.vk_alpha_1, "vk_alpha_1")?,
            beta_g2: json_g2(&vk.vk_beta_2, "vk_beta_2")?,
            gamma_g2: json_g2(&vk.vk_gamma_2, "vk_gamma_2")?,
            delta_g2: json_g2(&vk.vk_delta_2, "vk_delta_2")?,
            gamma_abc_g1: vk
                .ic
                .iter()
                .map(|point| json_g1(point, "IC"))
                .collect::<Result<_, _>>()?,
        };
        Ok(Self {
            name: name.into(),
            pvk: key.into(),
            n_public: vk.n_public,
        })
    }

    /// Read a verifying key file. The verifier is named after the file stem.
    pub fn from_file(path: &Path) -> Result<Self, VerificationError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| invalid(format!("{}: {e}", path.display())))?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::from_json_str(name, &json)
    }

    pub fn public_signal_count(&self) -> usize {
        self.n_public
    }

    fn proof(
        a: &[FieldElement; 2],
        b: &[[FieldElement; 2]; 2],
        c: &[FieldElement; 2],
    ) -> Option<Proof<Bn254>> {
        Some(Proof {
            a: g1(&a[0], &a[1])?,
            b: g2(fq2(&b[0][1], &b[0][0])?, fq2(&b[1][1], &b[1][0])?)?,
            c: g1(&c[0], &c[1])?,
        })
    }
}

impl fmt::Debug for Groth16Verifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Groth16Verifier")
            .field("name", &self.name)
            .field("n_public", &self.n_public)
            .finish()
    }
}

impl CircuitVerifier for Groth16Verifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn verify_proof(
        &self,
        a: &[FieldElement; 2],
        b: &[[FieldElement; 2]; 2],
        c: &[FieldElement; 2],
        pub_signals: &[FieldElement],
    ) -> bool {
        if pub_signals.len() != self.n_public {
            tracing::debug!(
                verifier = %self.name,
                expected = self.n_public,
                got = pub_signals.len(),
                "public signal count mismatch"
            );
            return false;
        }
        let Some(proof) = Self::proof(a, b, c) else {
            tracing::debug!(verifier = %self.name, "proof points are not on the curve");
            return false;
        };
        let Some(inputs) = pub_signals.iter().map(to_fr).collect::<Option<Vec<_>>>() else {
            tracing::debug!(verifier = %self.name, "public signal outside the scalar field");
            return false;
        };
        Groth16::<Bn254>::verify_proof(&self.pvk, &proof, &inputs).unwrap_or(false)
    }
}
