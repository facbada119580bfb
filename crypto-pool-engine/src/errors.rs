#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConstructionError {
    #[error("amplification coefficient outside the supported domain")]
    AmplificationOutOfDomain,

    #[error("gamma outside the supported domain")]
    GammaOutOfDomain,

    #[error("asset 0 must be the numeraire priced at 10^18")]
    BadNumeraire,

    #[error("initial price of asset 1 must be positive")]
    NonPositivePrice,

    #[error("fee bounds must satisfy mid_fee <= out_fee < 10^18")]
    InvalidFeeBounds,

    #[error("initial invariant too small to seed both reserves")]
    InsufficientLiquidity,

    #[error("parameters do not admit a positive invariant")]
    DegenerateCurve,
}

/// Reasons a swap or time-advance is rejected. A rejection leaves the pool
/// state exactly as it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("newton iteration exhausted its budget without converging")]
    SolverNonConvergence,

    #[error("invariant decreased beyond tolerance after fee application")]
    InvariantRegression,

    #[error("trade bounds rejected")]
    BoundsRejected,

    #[error("timestamps must be non-decreasing")]
    NonMonotonicTime,
}
