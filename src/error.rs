/// Everything that can go wrong in this crate.
///
/// Running out of a fixed-output sponge's budget is not an error: `squeeze`
/// returns the number of bytes it actually produced.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A sponge rate outside `1..=200` bytes.
    #[error("sponge rate {rate} is outside 1..=200 bytes")]
    InvalidRate { rate: usize },
    /// More inputs than the vector MAC has separator bytes for.
    #[error("vector MAC accepts at most {max} inputs, got {count}")]
    TooManyInputs { count: usize, max: usize },
    /// A tag length the construction does not accept.
    #[error("tag length {len} is outside {min}..={max} bytes")]
    InvalidTagLength { len: usize, min: usize, max: usize },
    /// Associated data whose length differs from the one the context was created with.
    #[error("associated data is {len} bytes, the context expects {expected}")]
    AssociatedDataLength { len: usize, expected: usize },
    /// An encoded input too short to contain its fixed-size fields.
    #[error("input of {len} bytes is shorter than the {min} byte minimum")]
    TruncatedInput { len: usize, min: usize },
    /// Absorbing into a sponge after output has been squeezed from it.
    #[error("cannot absorb into a sponge that has started squeezing")]
    AbsorbAfterSqueeze,
    /// The tag did not match; no plaintext is released.
    #[error("authentication failed")]
    AuthenticationFailure,
    /// The random number generator could not provide bytes.
    #[error("the entropy source failed")]
    EntropySource,
}
