//! # Variant References
//!
//! Writes and reads registry entries as their dense index, using exactly
//! `registry.bits()` bits. Network input only ever supplies indices, and every
//! index read is range-checked against the registry.

use royale_shared::{DefinitionIndex, Registry};

use super::stream::{BitReader, BitWriter};
use crate::error::{DecodeError, DecodeResult, EncodeError, EncodeResult};

/// Stream helpers for a [`Registry`].
pub trait VariantStream<D> {
    /// Writes `index` using the registry's bit width.
    ///
    /// # Errors
    ///
    /// [`EncodeError::ForeignVariant`] if the index does not belong to this
    /// registry, or a buffer overflow.
    fn write_to_stream(&self, writer: &mut BitWriter, index: DefinitionIndex<D>) -> EncodeResult<()>;

    /// Reads an index and checks it against the registry size.
    ///
    /// # Errors
    ///
    /// [`DecodeError::InvalidVariantIndex`] if the index is out of range, or
    /// a truncated stream.
    fn read_from_stream(&self, reader: &mut BitReader<'_>) -> DecodeResult<DefinitionIndex<D>>;

    /// Reads an index and resolves it to its definition.
    ///
    /// # Errors
    ///
    /// As [`VariantStream::read_from_stream`].
    fn read_definition(&self, reader: &mut BitReader<'_>) -> DecodeResult<(DefinitionIndex<D>, &D)>;
}

impl<D> VariantStream<D> for Registry<D> {
    fn write_to_stream(&self, writer: &mut BitWriter, index: DefinitionIndex<D>) -> EncodeResult<()> {
        if self.definition(index).is_none() {
            return Err(EncodeError::ForeignVariant {
                registry: self.name(),
                index: index.get(),
            });
        }
        writer.write_bits(u32::from(index.get()), self.bits())
    }

    fn read_from_stream(&self, reader: &mut BitReader<'_>) -> DecodeResult<DefinitionIndex<D>> {
        let raw = reader.read_bits(self.bits())?;
        self.index(raw as usize)
            .ok_or(DecodeError::InvalidVariantIndex {
                registry: self.name(),
                index: raw,
                len: self.len(),
            })
    }

    fn read_definition(&self, reader: &mut BitReader<'_>) -> DecodeResult<(DefinitionIndex<D>, &D)> {
        let index = self.read_from_stream(reader)?;
        let definition = self
            .definition(index)
            .ok_or(DecodeError::InvalidVariantIndex {
                registry: self.name(),
                index: u32::from(index.get()),
                len: self.len(),
            })?;
        Ok((index, definition))
    }
}

/// Resolves an index that is about to be written, for codecs whose layout
/// depends on the definition.
///
/// # Errors
///
/// [`EncodeError::ForeignVariant`] if the index does not belong to `registry`.
pub fn resolve<D>(registry: &Registry<D>, index: DefinitionIndex<D>) -> EncodeResult<&D> {
    registry
        .definition(index)
        .ok_or(EncodeError::ForeignVariant {
            registry: registry.name(),
            index: index.get(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use royale_shared::Definition;

    struct Named(&'static str);

    impl Definition for Named {
        fn id_string(&self) -> &str {
            self.0
        }
    }

    fn registry(names: &[&'static str]) -> Registry<Named> {
        Registry::new("test", names.iter().map(|&name| Named(name)).collect()).unwrap()
    }

    #[test]
    fn test_five_member_round_trip() {
        let registry = registry(&["a", "b", "c", "d", "e"]);
        let last = registry.index_of("e").unwrap();

        let mut writer = BitWriter::with_capacity(4);
        registry.write_to_stream(&mut writer, last).unwrap();
        assert_eq!(writer.bit_len(), 3);

        let mut reader = BitReader::new(writer.as_slice());
        let (index, definition) = registry.read_definition(&mut reader).unwrap();
        assert_eq!(index, last);
        assert_eq!(definition.id_string(), "e");
    }

    #[test]
    fn test_out_of_range_index_rejected() {
        let registry = registry(&["a", "b", "c", "d", "e"]);

        let mut writer = BitWriter::with_capacity(4);
        writer.write_bits(5, 3).unwrap();

        let mut reader = BitReader::new(writer.as_slice());
        assert_eq!(
            registry.read_from_stream(&mut reader),
            Err(DecodeError::InvalidVariantIndex {
                registry: "test",
                index: 5,
                len: 5
            })
        );
    }

    #[test]
    fn test_foreign_index_rejected() {
        let large = registry(&["a", "b", "c", "d", "e"]);
        let small = registry(&["a", "b"]);
        let foreign = large.index_of("e").unwrap();

        let mut writer = BitWriter::with_capacity(4);
        assert_eq!(
            small.write_to_stream(&mut writer, foreign),
            Err(EncodeError::ForeignVariant {
                registry: "test",
                index: 4
            })
        );
    }
}
