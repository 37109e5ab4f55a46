//! A real Groth16 circuit for exercising [`Groth16Verifier`] end to end.
//!
//! [`Groth16Verifier`]: stakepgp_verification::Groth16Verifier

use ark_bn254::{Bn254, Fq, Fr};
use ark_ff::{BigInteger, PrimeField};
use ark_groth16::{Groth16, ProvingKey, VerifyingKey};
use ark_relations::lc;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError, Variable};
use ark_snark::SNARK;
use ark_std::rand::rngs::StdRng;
use ark_std::rand::SeedableRng;
use serde_json::json;
use stakepgp_types::FieldElement;

/// Exposes each private witness as the public input at the same index.
#[derive(Clone)]
struct EchoCircuit {
    values: Vec<Option<Fr>>,
}

impl ConstraintSynthesizer<Fr> for EchoCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        for value in self.values {
            let input = cs.new_input_variable(|| value.ok_or(SynthesisError::AssignmentMissing))?;
            let witness =
                cs.new_witness_variable(|| value.ok_or(SynthesisError::AssignmentMissing))?;
            cs.enforce_constraint(lc!() + witness, lc!() + Variable::One, lc!() + input)?;
        }
        Ok(())
    }
}

/// The fixed-seed StdRng behind `ark_std::test_rng`, which the SNARK API
/// needs as a nameable `CryptoRng`.
fn test_rng() -> StdRng {
    StdRng::from_seed([
        1, 0, 0, 0, 23, 0, 0, 0, 200, 1, 0, 0, 210, 30, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
        0, 0, 0, 0,
    ])
}

fn element(value: Fq) -> FieldElement {
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&value.into_bigint().to_bytes_be());
    FieldElement::from_be_bytes(bytes)
}

/// Groth16 points in Solidity calldata order.
pub type ProofPoints = ([FieldElement; 2], [[FieldElement; 2]; 2], [FieldElement; 2]);

/// Keys for an n-input circuit, generated from a fixed seed.
pub struct Groth16Fixture {
    n_public: usize,
    pk: ProvingKey<Bn254>,
    vk: VerifyingKey<Bn254>,
}

impl Groth16Fixture {
    pub fn new(n_public: usize) -> Self {
        let circuit = EchoCircuit {
            values: vec![None; n_public],
        };
        let mut rng = test_rng();
        let (pk, vk) = Groth16::<Bn254>::circuit_specific_setup(circuit, &mut rng)
            .expect("echo circuit setup");
        Self { n_public, pk, vk }
    }

    /// The verifying key as snarkjs writes it.
    pub fn verifying_key_json(&self) -> String {
        let g1 = |p: &ark_bn254::G1Affine| json!([element(p.x), element(p.y), "1"]);
        let g2 = |p: &ark_bn254::G2Affine| {
            json!([
                [element(p.x.c0), element(p.x.c1)],
                [element(p.y.c0), element(p.y.c1)],
                ["1", "0"]
            ])
        };
        json!({
            "protocol": "groth16",
            "curve": "bn128",
            "nPublic": self.n_public,
            "vk_alpha_1": g1(&self.vk.alpha_g1),
            "vk_beta_2": g2(&self.vk.beta_g2),
            "vk_gamma_2": g2(&self.vk.gamma_g2),
            "vk_delta_2": g2(&self.vk.delta_g2),
            "IC": self.vk.gamma_abc_g1.iter().map(g1).collect::<Vec<_>>(),
        })
        .to_string()
    }

    /// Prove knowledge of `signals`. Each signal must be below the BN254
    /// scalar modulus.
    pub fn prove(&self, signals: &[FieldElement]) -> ProofPoints {
        assert_eq!(signals.len(), self.n_public, "signal count");
        let circuit = EchoCircuit {
            values: signals
                .iter()
                .map(|s| Some(Fr::from_be_bytes_mod_order(s.as_be_bytes())))
                .collect(),
        };
        let mut rng = test_rng();
        let proof = Groth16::<Bn254>::prove(&self.pk, circuit, &mut rng).expect("echo circuit proof");
        (
            [element(proof.a.x), element(proof.a.y)],
            [
                [element(proof.b.x.c1), element(proof.b.x.c0)],
                [element(proof.b.y.c1), element(proof.b.y.c0)],
            ],
            [element(proof.c.x), element(proof.c.y)],
        )
    }
}
