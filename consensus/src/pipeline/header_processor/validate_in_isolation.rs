use super::HeaderProcessor;
use crate::errors::BlockProcessResult;
use kestrel_consensus_core::{
    blockhash::BlockHashExtensions,
    config::constants::BLOCK_VERSION,
    errors::block::RuleError,
    header::Header,
};
use kestrel_core::time::unix_now;

impl HeaderProcessor {
    /// Structural header checks which need nothing but the header itself. The genesis header is exempt.
    pub fn validate_header_in_isolation(&self, header: &Header) -> BlockProcessResult<()> {
        if header.hash == self.genesis_hash {
            return Ok(());
        }

        self.check_header_version(header)?;
        self.check_block_timestamp_in_isolation(header)?;
        self.check_parents_limit(header)?;
        Self::check_parents_not_origin(header)?;
        Self::check_parents_order(header)?;
        Ok(())
    }

    fn check_header_version(&self, header: &Header) -> BlockProcessResult<()> {
        if header.version != BLOCK_VERSION {
            return Err(RuleError::WrongBlockVersion(header.version).into());
        }
        Ok(())
    }

    fn check_block_timestamp_in_isolation(&self, header: &Header) -> BlockProcessResult<()> {
        let max_block_time = unix_now() + self.timestamp_deviation_tolerance * self.target_time_per_block;
        if header.timestamp > max_block_time {
            return Err(RuleError::TimeTooMuchInTheFuture(header.timestamp, max_block_time).into());
        }
        Ok(())
    }

    fn check_parents_limit(&self, header: &Header) -> BlockProcessResult<()> {
        if header.direct_parents().is_empty() {
            return Err(RuleError::NoParents.into());
        }

        let max_block_parents = self.max_block_parents as usize;
        if header.direct_parents().len() > max_block_parents {
            return Err(RuleError::TooManyParents(header.direct_parents().len(), max_block_parents).into());
        }

        Ok(())
    }

    fn check_parents_not_origin(header: &Header) -> BlockProcessResult<()> {
        if header.direct_parents().iter().any(|&parent| parent.is_origin()) {
            return Err(RuleError::OriginParent.into());
        }

        Ok(())
    }

    fn check_parents_order(header: &Header) -> BlockProcessResult<()> {
        // Strictly ascending, which also rules out duplicate parents
        if header.direct_parents().windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(RuleError::WrongParentsOrder.into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::consensus::test_consensus::TestConsensus;
    use kestrel_consensus_core::{
        blockhash::ORIGIN,
        config::{ConfigBuilder, params::SIMNET_PARAMS},
        errors::block::RuleError,
        header::Header,
    };
    use kestrel_core::{assert_match, time::unix_now};
    use kestrel_hashes::Hash;

    fn header_with_parents(parents: Vec<Hash>) -> Header {
        let mut header = Header::from_precomputed_hash(Default::default(), parents);
        header.timestamp = unix_now();
        header.finalize();
        header
    }

    #[test]
    fn test_header_in_isolation() {
        let config = ConfigBuilder::new(SIMNET_PARAMS).skip_proof_of_work().build();
        let consensus = TestConsensus::new(&config);
        let processor = consensus.header_processor();

        let genesis = config.genesis.header();
        assert!(processor.validate_header_in_isolation(&genesis).is_ok());

        assert!(processor.validate_header_in_isolation(&header_with_parents(vec![1.into(), 2.into()])).is_ok());

        assert_match!(
            processor.validate_header_in_isolation(&header_with_parents(vec![])).unwrap_err().rule_error(),
            Some(RuleError::NoParents)
        );

        let eleven = (1..=11u64).map(Hash::from).collect();
        assert_match!(
            processor.validate_header_in_isolation(&header_with_parents(eleven)).unwrap_err().rule_error(),
            Some(RuleError::TooManyParents(11, 10))
        );

        assert_match!(
            processor.validate_header_in_isolation(&header_with_parents(vec![2.into(), 1.into()])).unwrap_err().rule_error(),
            Some(RuleError::WrongParentsOrder)
        );
        assert_match!(
            processor.validate_header_in_isolation(&header_with_parents(vec![1.into(), 1.into()])).unwrap_err().rule_error(),
            Some(RuleError::WrongParentsOrder)
        );
        assert_match!(
            processor.validate_header_in_isolation(&header_with_parents(vec![ORIGIN])).unwrap_err().rule_error(),
            Some(RuleError::OriginParent)
        );

        let mut header = header_with_parents(vec![1.into()]);
        header.version += 1;
        header.finalize();
        assert_match!(
            processor.validate_header_in_isolation(&header).unwrap_err().rule_error(),
            Some(RuleError::WrongBlockVersion(_))
        );

        let mut header = header_with_parents(vec![1.into()]);
        header.timestamp = config.max_allowed_timestamp(unix_now()) + 60_000;
        header.finalize();
        assert_match!(
            processor.validate_header_in_isolation(&header).unwrap_err().rule_error(),
            Some(RuleError::TimeTooMuchInTheFuture(_, _))
        );
    }
}
