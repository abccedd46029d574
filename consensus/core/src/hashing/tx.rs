use super::HasherExtensions;
use crate::tx::{Transaction, TransactionId, TransactionInput, TransactionOutpoint, TransactionOutput};
use kestrel_hashes::{Hash, Hasher, HasherBase};

/// Selects which transaction fields are committed to by the encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TxEncoding {
    Full,
    ExcludeSignatureScript,
}

/// Returns the transaction hash. Note that this is different than the transaction ID.
pub fn hash(tx: &Transaction) -> Hash {
    let mut hasher = kestrel_hashes::TransactionHash::new();
    write_transaction(&mut hasher, tx, TxEncoding::Full);
    hasher.finalize()
}

/// Not intended for direct use by clients. Instead use `tx.id()`
pub fn id(tx: &Transaction) -> TransactionId {
    // Encode the transaction, replace signature script with zeroes, cut off
    // payload and hash the result.
    let mut hasher = kestrel_hashes::TransactionID::new();
    write_transaction(&mut hasher, tx, TxEncoding::ExcludeSignatureScript);
    hasher.finalize()
}

/// Write the transaction into the provided hasher according to the encoding
fn write_transaction<T: HasherBase>(hasher: &mut T, tx: &Transaction, encoding: TxEncoding) {
    hasher.update(tx.version.to_le_bytes()).write_len(tx.inputs.len());
    for input in tx.inputs.iter() {
        write_input(hasher, input, encoding);
    }

    hasher.write_len(tx.outputs.len());
    for output in tx.outputs.iter() {
        write_output(hasher, output);
    }

    hasher.update(tx.lock_time.to_le_bytes()).update(tx.subnetwork_id).update(tx.gas.to_le_bytes()).write_var_bytes(&tx.payload);
}

#[inline(always)]
fn write_input<T: HasherBase>(hasher: &mut T, input: &TransactionInput, encoding: TxEncoding) {
    write_outpoint(hasher, &input.previous_outpoint);
    match encoding {
        TxEncoding::Full => {
            hasher.write_var_bytes(input.signature_script.as_slice()).update([input.sig_op_count]);
        }
        TxEncoding::ExcludeSignatureScript => {
            hasher.write_var_bytes(&[]);
        }
    }
    hasher.update(input.sequence.to_le_bytes());
}

#[inline(always)]
fn write_outpoint<T: HasherBase>(hasher: &mut T, outpoint: &TransactionOutpoint) {
    hasher.update(outpoint.transaction_id).update(outpoint.index.to_le_bytes());
}

#[inline(always)]
fn write_output<T: HasherBase>(hasher: &mut T, output: &TransactionOutput) {
    hasher
        .update(output.value.to_le_bytes())
        .update(output.script_public_key.version.to_le_bytes())
        .write_var_bytes(output.script_public_key.script());
}
