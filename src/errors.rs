/// Errors that can occur during DNS codec and resolver operations
#[derive(Debug, thiserror::Error)]
pub enum DnsError {
    #[error("end of buffer")]
    EndOfBuffer,

    #[error("limit of {0} name compression jumps exceeded")]
    TooManyJumps(usize),

    #[error("label '{0}' exceeds maximum length of 63 octets")]
    LabelTooLong(String),

    #[error("resolution budget exhausted")]
    BudgetExhausted,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{context}: {source}")]
    Decode {
        context: &'static str,
        #[source]
        source: Box<DnsError>,
    },
}

pub type Result<T> = std::result::Result<T, DnsError>;

/// Wraps decode errors with the field site that produced them, e.g.
/// "reading dns record ttl".
pub trait Context<T> {
    fn context(self, context: &'static str) -> Result<T>;
}

impl<T> Context<T> for Result<T> {
    fn context(self, context: &'static str) -> Result<T> {
        self.map_err(|source| DnsError::Decode {
            context,
            source: Box::new(source),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_wraps_site() {
        let err: Result<u8> = Err(DnsError::EndOfBuffer);
        let wrapped = err.context("reading dns record ttl").unwrap_err();

        assert_eq!(wrapped.to_string(), "reading dns record ttl: end of buffer");
    }

    #[test]
    fn test_context_passes_ok_through() {
        let ok: Result<u8> = Ok(7);
        assert_eq!(ok.context("reading something").unwrap(), 7);
    }
}
