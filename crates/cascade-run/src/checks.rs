//! Certificates and gates over the built-in chain

use cascade_certify::{Certificate, GateCheck, Verifier};

use crate::units::paths::*;

/// Super-Kamiokande floor on p -> e+ pi0 [years].
const PROTON_LIFETIME_FLOOR_YEARS: f64 = 2.4e34;

/// Tolerance for identities that are exact up to f64 rounding.
const IDENTITY_TOL: f64 = 1e-9;

/// Residual allowed between couplings that meet by construction.
const MEET_TOL: f64 = 1e-6;

/// The certification set for the built-in chain.
pub fn verifier() -> Verifier {
    let mut verifier = Verifier::new();

    verifier.add_certificate(Certificate::at_least(
        "proton-lifetime-floor",
        PROTON_LIFETIME,
        PROTON_LIFETIME_FLOOR_YEARS,
    ));

    verifier.add_certificate(Certificate::bounded(
        "gut-scale-window",
        M_GUT,
        1.0e15,
        1.0e17,
    ));

    verifier.add_certificate(
        Certificate::new(
            "weak-mixing-consistency",
            "re-derived weak mixing angle matches the measured input",
            |ctx| {
                let measured = ctx.scalar(&SIN2_THETA_W.into())?;
                let derived = ctx.scalar(&SIN2_DERIVED.into())?;
                Ok((measured - derived).abs() <= IDENTITY_TOL)
            },
        )
        .with_tolerance(IDENTITY_TOL),
    );

    verifier.add_certificate(Certificate::at_least(
        "coupling-positivity",
        ALPHA_GUT_INV,
        0.0,
    ));

    verifier.add_gate(GateCheck::new(
        "unification",
        "couplings-meet",
        "first two gut-scale couplings agree within the meeting residual",
        |ctx| {
            let couplings = ctx.value(&COUPLINGS_GUT.into())?;
            let Some(values) = couplings.as_tuple() else {
                return Ok(false);
            };
            if values.len() < 2 {
                return Ok(false);
            }
            Ok((values[0] - values[1]).abs() <= MEET_TOL)
        },
    ));

    verifier.add_gate(GateCheck::new(
        "unification",
        "scale-ordering",
        "unification scale sits below the Planck scale",
        |ctx| {
            let m_gut = ctx.scalar(&M_GUT.into())?;
            let m_pl = ctx.scalar(&M_PLANCK.into())?;
            Ok(m_gut < m_pl)
        },
    ));

    verifier
}
