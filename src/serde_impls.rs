//! Serde support: a multiset serializes as a flat sequence in iteration
//! order, duplicates included, and deserializes from any sequence.

use crate::hash_eq::HashEq;
use crate::multiset::UnorderedMultiset;
use core::fmt;
use core::marker::PhantomData;
use serde::de::{SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

impl<T, E> Serialize for UnorderedMultiset<T, E>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for v in self.iter() {
            seq.serialize_element(v)?;
        }
        seq.end()
    }
}

impl<'de, T, E> Deserialize<'de> for UnorderedMultiset<T, E>
where
    T: Deserialize<'de>,
    E: HashEq<T> + Default,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct MultisetVisitor<T, E>(PhantomData<(T, E)>);

        impl<'de, T, E> Visitor<'de> for MultisetVisitor<T, E>
        where
            T: Deserialize<'de>,
            E: HashEq<T> + Default,
        {
            type Value = UnorderedMultiset<T, E>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a sequence of multiset elements")
            }

            fn visit_seq<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                // Collect first so the bucket table is sized once for the exact count.
                let mut items = Vec::with_capacity(access.size_hint().unwrap_or(0).min(4096));
                while let Some(v) = access.next_element()? {
                    items.push(v);
                }
                Ok(UnorderedMultiset::from_vec(items))
            }
        }

        deserializer.deserialize_seq(MultisetVisitor(PhantomData))
    }
}
