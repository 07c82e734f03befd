use crate::{
    bson::{RawArrayBuf, RawDocumentBuf},
    error::Result,
};

/// The length of an encoded document with no fields: a four byte length prefix followed by the
/// null terminator.
pub(crate) const EMPTY_DOCUMENT_SIZE: usize = 5;

/// Whether the encoded document contains no fields.
pub(crate) fn is_empty_document(doc: &RawDocumentBuf) -> bool {
    doc.as_bytes().len() <= EMPTY_DOCUMENT_SIZE
}

/// The size in bytes of the provided document when embedded at `index` in a BSON array.
pub(crate) fn array_entry_size_bytes(index: usize, doc_len: usize) -> usize {
    //   * type (1 byte)
    //   * number of decimal digits in key
    //   * null terminator for the key (1 byte)
    //   * size of value

    1 + num_decimal_digits(index) + 1 + doc_len
}

/// The number of digits in `n` in base 10.
/// Useful for calculating the size of an array entry in BSON.
fn num_decimal_digits(mut n: usize) -> usize {
    let mut digits = 0;

    loop {
        n /= 10;
        digits += 1;

        if n == 0 {
            return digits;
        }
    }
}

pub(crate) fn vec_to_raw_array_buf(docs: Vec<RawDocumentBuf>) -> RawArrayBuf {
    let mut array = RawArrayBuf::new();
    for doc in docs {
        array.push(doc);
    }
    array
}

/// Appends every field of `other` to `this`.
pub(crate) fn extend_raw_document_buf(
    this: &mut RawDocumentBuf,
    other: RawDocumentBuf,
) -> Result<()> {
    for result in other.iter() {
        let (k, v) = result?;
        this.append(k, v.to_raw_bson());
    }
    Ok(())
}
