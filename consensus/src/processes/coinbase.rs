use kestrel_consensus_core::{
    coinbase::*,
    config::constants::TX_VERSION,
    errors::coinbase::{CoinbaseError, CoinbaseResult},
    subnets,
    tx::{ScriptPublicKey, Transaction, TransactionOutput},
};

const LENGTH_OF_BLUE_SCORE: usize = size_of::<u64>();
const LENGTH_OF_SUBSIDY: usize = size_of::<u64>();
const LENGTH_OF_SCRIPT_PUB_KEY_VERSION: usize = size_of::<u16>();
const LENGTH_OF_SCRIPT_PUB_KEY_LENGTH: usize = size_of::<u8>();

pub const MIN_PAYLOAD_LENGTH: usize =
    LENGTH_OF_BLUE_SCORE + LENGTH_OF_SUBSIDY + LENGTH_OF_SCRIPT_PUB_KEY_VERSION + LENGTH_OF_SCRIPT_PUB_KEY_LENGTH;

#[derive(Clone)]
pub struct CoinbaseManager {
    coinbase_payload_script_public_key_max_len: u8,
    max_coinbase_payload_len: usize,
    base_subsidy: u64,
}

/// Struct used to streamline payload parsing
struct PayloadParser<'a> {
    remaining: &'a [u8], // The unparsed remainder
}

impl<'a> PayloadParser<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { remaining: data }
    }

    /// Returns a slice with the first `n` bytes of `remaining`, while setting `remaining` to the remaining part.
    /// Callers verify the length beforehand
    fn take(&mut self, n: usize) -> &'a [u8] {
        let (segment, remaining) = self.remaining.split_at(n);
        self.remaining = remaining;
        segment
    }

    fn take_array<const N: usize>(&mut self) -> [u8; N] {
        let mut array = [0u8; N];
        array.copy_from_slice(self.take(N));
        array
    }
}

impl CoinbaseManager {
    pub fn new(coinbase_payload_script_public_key_max_len: u8, max_coinbase_payload_len: usize, base_subsidy: u64) -> Self {
        Self { coinbase_payload_script_public_key_max_len, max_coinbase_payload_len, base_subsidy }
    }

    pub fn max_coinbase_payload_len(&self) -> usize {
        self.max_coinbase_payload_len
    }

    /// Builds the coinbase transaction of a new block, paying its subsidy and the fees of
    /// the transactions it accepts to the miner script
    pub fn expected_coinbase_transaction<T: AsRef<[u8]>>(
        &self,
        blue_score: u64,
        daa_score: u64,
        miner_data: MinerData<T>,
        total_fees: u64,
    ) -> CoinbaseResult<Transaction> {
        let subsidy = self.calc_block_subsidy(daa_score);
        let reward = subsidy.saturating_add(total_fees);

        let mut outputs = Vec::with_capacity(1);
        if reward > 0 {
            outputs.push(TransactionOutput::new(reward, miner_data.script_public_key.clone()));
        }

        let payload = self.serialize_coinbase_payload(&CoinbaseData { blue_score, subsidy, miner_data })?;
        if payload.len() > self.max_coinbase_payload_len {
            return Err(CoinbaseError::PayloadLenAboveMax(payload.len(), self.max_coinbase_payload_len));
        }

        Ok(Transaction::new(TX_VERSION, vec![], outputs, 0, subnets::SUBNETWORK_ID_COINBASE, 0, payload))
    }

    pub fn serialize_coinbase_payload<T: AsRef<[u8]>>(&self, data: &CoinbaseData<T>) -> CoinbaseResult<Vec<u8>> {
        let script_pub_key_len = data.miner_data.script_public_key.script().len();
        if script_pub_key_len > self.coinbase_payload_script_public_key_max_len as usize {
            return Err(CoinbaseError::PayloadScriptPublicKeyLenAboveMax(
                script_pub_key_len,
                self.coinbase_payload_script_public_key_max_len,
            ));
        }
        let payload: Vec<u8> = data.blue_score.to_le_bytes().iter().copied()                    // Blue score                   (u64)
            .chain(data.subsidy.to_le_bytes().iter().copied())                                  // Subsidy                      (u64)
            .chain(data.miner_data.script_public_key.version.to_le_bytes().iter().copied())     // Script public key version    (u16)
            .chain((script_pub_key_len as u8).to_le_bytes().iter().copied())                    // Script public key length     (u8)
            .chain(data.miner_data.script_public_key.script().iter().copied())                  // Script public key
            .chain(data.miner_data.extra_data.as_ref().iter().copied())                         // Extra data
            .collect();

        Ok(payload)
    }

    pub fn deserialize_coinbase_payload<'a>(&self, payload: &'a [u8]) -> CoinbaseResult<CoinbaseData<&'a [u8]>> {
        if payload.len() < MIN_PAYLOAD_LENGTH {
            return Err(CoinbaseError::PayloadLenBelowMin(payload.len(), MIN_PAYLOAD_LENGTH));
        }

        if payload.len() > self.max_coinbase_payload_len {
            return Err(CoinbaseError::PayloadLenAboveMax(payload.len(), self.max_coinbase_payload_len));
        }

        let mut parser = PayloadParser::new(payload);

        let blue_score = u64::from_le_bytes(parser.take_array());
        let subsidy = u64::from_le_bytes(parser.take_array());
        let script_pub_key_version = u16::from_le_bytes(parser.take_array());
        let script_pub_key_len = u8::from_le_bytes(parser.take_array());

        if script_pub_key_len > self.coinbase_payload_script_public_key_max_len {
            return Err(CoinbaseError::PayloadScriptPublicKeyLenAboveMax(
                script_pub_key_len as usize,
                self.coinbase_payload_script_public_key_max_len,
            ));
        }

        if parser.remaining.len() < script_pub_key_len as usize {
            return Err(CoinbaseError::PayloadCantContainScriptPublicKey(
                payload.len(),
                MIN_PAYLOAD_LENGTH + script_pub_key_len as usize,
            ));
        }

        let script_public_key = ScriptPublicKey::new(script_pub_key_version, parser.take(script_pub_key_len as usize).to_vec());
        let extra_data = parser.remaining;

        Ok(CoinbaseData { blue_score, subsidy, miner_data: MinerData { script_public_key, extra_data } })
    }

    /// The block subsidy is flat; emission schedules are a concern of the network parameters
    pub fn calc_block_subsidy(&self, _daa_score: u64) -> u64 {
        self.base_subsidy
    }
}
