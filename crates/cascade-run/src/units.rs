//! Built-in derivation chain
//!
//! Four units take the measured electroweak-scale inputs to the
//! unification scale and its consequences: GUT-normalized couplings,
//! the scale where the first two meet under one-loop running, the
//! gauge-mediated proton lifetime estimate, and a weak-mixing
//! consistency value re-derived from the running couplings.

use linkme::distributed_slice;

use cascade_engine::formula::{FormulaDef, FORMULAS};
use cascade_engine::{outputs, Engine, FnUnit};
use cascade_registry::Value;

use std::f64::consts::TAU;

/// Parameter paths shared by units, checks, and tests.
pub mod paths {
    pub const M_Z: &str = "ew.m_z";
    pub const ALPHA_EM_INV: &str = "ew.alpha_em_inv_mz";
    pub const SIN2_THETA_W: &str = "ew.sin2_theta_w";
    pub const ALPHA_S: &str = "ew.alpha_s_mz";
    pub const M_PLANCK: &str = "planck.m_pl";

    pub const ALPHA1_INV: &str = "gauge.alpha1_inv_mz";
    pub const ALPHA2_INV: &str = "gauge.alpha2_inv_mz";
    pub const ALPHA3_INV: &str = "gauge.alpha3_inv_mz";
    pub const M_GUT: &str = "gauge.m_gut";
    pub const ALPHA_GUT_INV: &str = "gauge.alpha_gut_inv";
    pub const COUPLINGS_GUT: &str = "gauge.couplings_gut";

    pub const PROTON_LIFETIME: &str = "proton.lifetime_years";
    pub const SIN2_DERIVED: &str = "ew.sin2_theta_w_derived";
}

use paths::*;

// One-loop beta coefficients, MSSM spectrum, GUT-normalized hypercharge
const B1: f64 = 33.0 / 5.0;
const B2: f64 = 1.0;
const B3: f64 = -3.0;

#[distributed_slice(FORMULAS)]
static HYPERCHARGE_EMBEDDING: FormulaDef = FormulaDef {
    id: "hypercharge-embedding",
    inputs: &[ALPHA_EM_INV, SIN2_THETA_W],
    outputs: &[ALPHA1_INV, ALPHA2_INV],
    derivation: "alpha1_inv = (3/5) cos^2(theta_w) alpha_em_inv, alpha2_inv = sin^2(theta_w) alpha_em_inv",
};

#[distributed_slice(FORMULAS)]
static STRONG_INVERSION: FormulaDef = FormulaDef {
    id: "strong-inversion",
    inputs: &[ALPHA_S],
    outputs: &[ALPHA3_INV],
    derivation: "alpha3_inv = 1 / alpha_s",
};

#[distributed_slice(FORMULAS)]
static ONE_LOOP_MEETING: FormulaDef = FormulaDef {
    id: "one-loop-meeting",
    inputs: &[ALPHA1_INV, ALPHA2_INV, M_Z],
    outputs: &[M_GUT, ALPHA_GUT_INV],
    derivation: "solve alpha1(mu) = alpha2(mu) for mu under one-loop running, \
                 alpha_i_inv(mu) = alpha_i_inv(m_z) - (b_i / 2 pi) ln(mu / m_z)",
};

#[distributed_slice(FORMULAS)]
static DIMENSION_SIX_LIFETIME: FormulaDef = FormulaDef {
    id: "dimension-six-lifetime",
    inputs: &[M_GUT, ALPHA_GUT_INV],
    outputs: &[PROTON_LIFETIME],
    derivation: "gauge-boson-mediated decay, tau ~ alpha_gut^-2 m_gut^4 / m_p^5",
};

#[distributed_slice(FORMULAS)]
static WEAK_MIXING_RATIO: FormulaDef = FormulaDef {
    id: "weak-mixing-ratio",
    inputs: &[ALPHA2_INV, ALPHA_EM_INV],
    outputs: &[SIN2_DERIVED],
    derivation: "sin^2(theta_w) = alpha2_inv / alpha_em_inv",
};

/// GUT-normalized inverse couplings at m_Z from the measured inputs.
fn gauge_running() -> FnUnit {
    FnUnit::new("gauge-running", "1.0")
        .reads(&[ALPHA_EM_INV, SIN2_THETA_W, ALPHA_S])
        .writes(&[ALPHA1_INV, ALPHA2_INV, ALPHA3_INV])
        .formulas(&["hypercharge-embedding", "strong-inversion"])
        .compute(|store| {
            let alpha_em_inv = store.scalar(&ALPHA_EM_INV.into())?;
            let sin2 = store.scalar(&SIN2_THETA_W.into())?;
            let alpha_s = store.scalar(&ALPHA_S.into())?;

            let alpha1_inv = 0.6 * (1.0 - sin2) * alpha_em_inv;
            let alpha2_inv = sin2 * alpha_em_inv;
            let alpha3_inv = 1.0 / alpha_s;

            Ok(outputs([
                (ALPHA1_INV, Value::Scalar(alpha1_inv)),
                (ALPHA2_INV, Value::Scalar(alpha2_inv)),
                (ALPHA3_INV, Value::Scalar(alpha3_inv)),
            ]))
        })
}

/// Scale where the first two couplings meet, and the couplings there.
fn unification() -> FnUnit {
    FnUnit::new("unification", "1.0")
        .reads(&[ALPHA1_INV, ALPHA2_INV, ALPHA3_INV, M_Z])
        .writes(&[M_GUT, ALPHA_GUT_INV, COUPLINGS_GUT])
        .formulas(&["one-loop-meeting"])
        .compute(|store| {
            let a1 = store.scalar(&ALPHA1_INV.into())?;
            let a2 = store.scalar(&ALPHA2_INV.into())?;
            let a3 = store.scalar(&ALPHA3_INV.into())?;
            let m_z = store.scalar(&M_Z.into())?;

            // ln(m_gut / m_z) from the alpha1 = alpha2 meeting condition
            let t = TAU * (a1 - a2) / (B1 - B2);
            let m_gut = m_z * t.exp();

            let a1_gut = a1 - B1 * t / TAU;
            let a2_gut = a2 - B2 * t / TAU;
            let a3_gut = a3 - B3 * t / TAU;

            Ok(outputs([
                (M_GUT, Value::Scalar(m_gut)),
                (ALPHA_GUT_INV, Value::Scalar(a1_gut)),
                (COUPLINGS_GUT, Value::Tuple(vec![a1_gut, a2_gut, a3_gut])),
            ]))
        })
}

/// Dimension-six proton lifetime estimate in years.
///
/// The prefactor absorbs the hadronic matrix element and phase space;
/// only the scaling in m_gut and alpha_gut is meaningful here.
fn proton_decay() -> FnUnit {
    FnUnit::new("proton-decay", "1.0")
        .reads(&[M_GUT, ALPHA_GUT_INV])
        .writes(&[PROTON_LIFETIME])
        .formulas(&["dimension-six-lifetime"])
        .compute(|store| {
            let m_gut = store.scalar(&M_GUT.into())?;
            let alpha_gut_inv = store.scalar(&ALPHA_GUT_INV.into())?;

            let scale = m_gut / 1.0e16;
            let coupling = alpha_gut_inv / 25.0;
            let tau_years = 2.0e34 * coupling.powi(2) * scale.powi(4);

            Ok(outputs([(PROTON_LIFETIME, Value::Scalar(tau_years))]))
        })
}

/// Re-derive the weak mixing angle from the running couplings.
fn weak_mixing() -> FnUnit {
    FnUnit::new("weak-mixing", "1.0")
        .reads(&[ALPHA2_INV, ALPHA_EM_INV])
        .writes(&[SIN2_DERIVED])
        .formulas(&["weak-mixing-ratio"])
        .compute(|store| {
            let a2 = store.scalar(&ALPHA2_INV.into())?;
            let alpha_em_inv = store.scalar(&ALPHA_EM_INV.into())?;

            Ok(outputs([(
                SIN2_DERIVED,
                Value::Scalar(a2 / alpha_em_inv),
            )]))
        })
}

/// Register the whole chain.
pub fn register_all(engine: &mut Engine) -> cascade_engine::Result<()> {
    engine.register(gauge_running())?;
    engine.register(unification())?;
    engine.register(proton_decay())?;
    engine.register(weak_mixing())?;
    Ok(())
}
