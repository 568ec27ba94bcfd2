use ::bincode::config::standard as bincode_config;
use ::bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Serialize, de::DeserializeOwned};

use super::{Format, FormatError};

/// Bincode format (compact binary, standard configuration)
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeFormat;

impl Format for BincodeFormat {
    fn encode<T>(&self, value: &T) -> Result<Vec<u8>, FormatError>
    where
        T: Serialize + ?Sized,
    {
        encode_to_vec(value, bincode_config()).map_err(|e| FormatError::Serialize(Box::new(e)))
    }

    fn decode<T>(&self, data: &[u8]) -> Result<T, FormatError>
    where
        T: DeserializeOwned,
    {
        let (value, _read): (T, usize) = decode_from_slice(data, bincode_config())
            .map_err(|e| FormatError::Deserialize(Box::new(e)))?;
        Ok(value)
    }
}
