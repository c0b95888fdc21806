use anyhow::Result;

use StrataDB::tuple::{Decoder, Tuple, Value};
use StrataDB::StorageError;

fn random_value(rng: &mut oorandom::Rand32) -> Value {
    if rng.rand_range(0..2) == 0 {
        Value::Int(rng.rand_i32())
    } else {
        let len = rng.rand_range(0..40) as usize;
        let s: String = (0..len)
            .map(|_| {
                let c = rng.rand_range(0..30);
                if c == 0 {
                    'ж'
                } else {
                    (b'a' + (c % 26) as u8) as char
                }
            })
            .collect();
        Value::Text(s)
    }
}

#[test]
fn random_tuples_roundtrip() -> Result<()> {
    let mut rng = oorandom::Rand32::new(0x5eed);
    for _ in 0..200 {
        let n = rng.rand_range(0..65) as usize;
        let values: Vec<Value> = (0..n).map(|_| random_value(&mut rng)).collect();
        let t = Tuple::new(values.clone());

        let bytes = t.serialize()?;
        assert_eq!(bytes.len(), t.encoded_len());
        let back = Tuple::from_bytes(&bytes)?;
        assert_eq!(back.values(), values.as_slice());
    }
    Ok(())
}

#[test]
fn tuples_decode_back_to_back() -> Result<()> {
    let a = Tuple::new(vec![Value::Int(1), Value::from("x")]);
    let b = Tuple::new(vec![]);
    let mut buf = a.serialize()?;
    buf.extend(b.serialize()?);

    let mut dec = Decoder::new(&buf);
    assert_eq!(Tuple::deserialize(&mut dec)?, a);
    assert_eq!(Tuple::deserialize(&mut dec)?, b);
    assert_eq!(dec.remaining(), 0);
    Ok(())
}

#[test]
fn truncated_and_unknown_tags_rejected() -> Result<()> {
    let bytes = Tuple::new(vec![Value::from("hello"), Value::Int(5)]).serialize()?;
    for cut in 0..bytes.len() {
        let err = Tuple::from_bytes(&bytes[..cut]).unwrap_err();
        assert!(matches!(err, StorageError::CorruptEncoding(_)), "cut={}", cut);
    }

    // count=1, tag=9
    let err = Tuple::from_bytes(&[1, 0, 9, 0, 0, 0, 0]).unwrap_err();
    assert!(matches!(err, StorageError::CorruptEncoding(_)));
    Ok(())
}
