use snafu::Snafu;
use tessera_dtype::DType;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Structural failure while rewriting the graph.
    #[snafu(display("graph rewrite failed: {source}"))]
    Ir { source: tessera_ir::Error },

    /// Dequantization constants must be floating point.
    #[snafu(display("dequantization precision must be a float type, got {dtype}"))]
    UnsupportedPrecision { dtype: DType },
}
