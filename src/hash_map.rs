use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;

use crate::error::TableError;

/// Sentinel index marking the end of a bucket chain or the free list.
const NIL: usize = usize::MAX;

/// The bucket array never shrinks below this size.
const MIN_CAPACITY: usize = 16;

#[inline(always)]
fn grow_threshold(capacity: usize) -> usize {
    ((capacity as u128 * 7) / 10) as usize
}

#[inline(always)]
fn shrink_threshold(capacity: usize) -> usize {
    capacity / 4
}

#[inline(always)]
fn normalize_capacity(capacity: usize) -> Option<usize> {
    capacity
        .checked_next_power_of_two()
        .map(|capacity| capacity.max(MIN_CAPACITY))
}

/// A hash map implemented with separate chaining over an index-linked entry
/// arena.
///
/// `HashMap<K, V, S>` stores key-value pairs where keys implement `Hash + Eq`
/// and uses a configurable hasher builder `S` to hash keys. Each entry caches
/// the full 64-bit hash of its key: lookups compare cached hashes before
/// falling back to `Eq`, and resizes relink entries from their cached hashes
/// without ever re-hashing a key.
///
/// The bucket array always holds a power-of-two number of buckets, at least
/// 16. An insert that would bring the map to 70% of its bucket count doubles
/// the array first; a removal that leaves it at 25% or less halves the array,
/// never below 16.
///
/// # Performance Characteristics
///
/// - **Memory**: one `usize` bucket head per bucket, plus a `u64` hash and a
///   `usize` chain link per entry alongside `(K, V)`
/// - **Operations**: amortized O(1) insert, lookup, and remove; worst case is
///   the length of one bucket chain
#[derive(Clone)]
pub struct HashMap<K, V, S> {
    table: Table<K, V>,
    hash_builder: S,
}

impl<K, V, S> Debug for HashMap<K, V, S>
where
    K: Debug + Hash + Eq,
    V: Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut map = f.debug_map();
        for (k, v) in self.iter() {
            map.entry(k, v);
        }
        map.finish()
    }
}

impl<K, V, S> HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Creates a new hash map with the given hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use chain_hash::HashMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let map: HashMap<i32, String, _> = HashMap::with_hasher(SimpleHasher);
    /// assert!(map.is_empty());
    /// assert_eq!(map.capacity(), 16);
    /// ```
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_capacity_and_hasher(0, hash_builder)
    }

    /// Creates a new hash map with the specified capacity and hasher builder.
    ///
    /// The map allocates at least `capacity` buckets; the actual bucket count
    /// is the next power of two, with a floor of 16.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use chain_hash::HashMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let map: HashMap<i32, String, _> = HashMap::with_capacity_and_hasher(100, SimpleHasher);
    /// assert!(map.capacity() >= 100);
    /// ```
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        Self {
            table: Table::with_capacity(capacity),
            hash_builder,
        }
    }

    /// Creates a new hash map with the specified capacity and hasher builder,
    /// reporting allocation failure instead of aborting.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Buckets`] if the bucket array cannot be
    /// allocated, or [`TableError::CapacityOverflow`] if `capacity` cannot be
    /// rounded up to a power of two.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use chain_hash::HashMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let map = HashMap::<i32, String, _>::try_with_capacity_and_hasher(100, SimpleHasher);
    /// assert!(map.is_ok());
    ///
    /// let huge = HashMap::<i32, String, _>::try_with_capacity_and_hasher(usize::MAX, SimpleHasher);
    /// assert!(huge.is_err());
    /// ```
    pub fn try_with_capacity_and_hasher(
        capacity: usize,
        hash_builder: S,
    ) -> Result<Self, TableError> {
        Ok(Self {
            table: Table::try_with_capacity(capacity)?,
            hash_builder,
        })
    }

    /// Returns the number of elements in the map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use chain_hash::HashMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let mut map = HashMap::with_hasher(SimpleHasher);
    /// assert_eq!(map.len(), 0);
    /// map.insert(1, "a");
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn len(&self) -> usize {
        self.table.len
    }

    /// Returns `true` if the map contains no elements.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use chain_hash::HashMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let mut map = HashMap::with_hasher(SimpleHasher);
    /// assert!(map.is_empty());
    /// map.insert(1, "a");
    /// assert!(!map.is_empty());
    /// ```
    pub fn is_empty(&self) -> bool {
        self.table.len == 0
    }

    /// Returns the number of buckets currently allocated by the map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use chain_hash::HashMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let map: HashMap<i32, String, _> = HashMap::with_capacity_and_hasher(100, SimpleHasher);
    /// assert!(map.capacity() >= 100);
    /// ```
    ///
    /// # Load Factor
    ///
    /// An insert that would bring the map to 70% of its bucket count doubles
    /// the bucket array before placing the entry. A removal that leaves the
    /// map at 25% or less halves it, never below 16 buckets.
    pub fn capacity(&self) -> usize {
        self.table.buckets.len()
    }

    /// Removes all elements from the map.
    ///
    /// This operation preserves the map's allocated capacity.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use chain_hash::HashMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let mut map = HashMap::with_hasher(SimpleHasher);
    /// map.insert(1, "a");
    /// assert!(!map.is_empty());
    /// map.clear();
    /// assert!(map.is_empty());
    /// ```
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Shrinks the capacity of the map as much as possible.
    ///
    /// The bucket array is halved while the map sits at or below 25% of it,
    /// never below 16 buckets, and the entry storage is compacted to the
    /// current number of elements.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use chain_hash::HashMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let mut map = HashMap::with_capacity_and_hasher(100, SimpleHasher);
    /// map.insert(1, "one");
    /// map.insert(2, "two");
    ///
    /// // The map has a large capacity but only 2 elements
    /// assert!(map.capacity() >= 100);
    /// assert_eq!(map.len(), 2);
    ///
    /// map.shrink_to_fit();
    ///
    /// assert_eq!(map.capacity(), 16);
    /// assert_eq!(map.len(), 2);
    /// ```
    pub fn shrink_to_fit(&mut self) {
        self.table.shrink_to_fit();
    }

    /// Reserves capacity for at least `additional` more elements.
    ///
    /// After this call, the next `additional` inserts will not resize the
    /// bucket array.
    pub fn reserve(&mut self, additional: usize) {
        self.table.reserve(additional);
    }

    /// Reserves capacity for at least `additional` more elements, reporting
    /// allocation failure instead of aborting.
    ///
    /// # Errors
    ///
    /// Returns an error if the bucket array or the entry storage cannot be
    /// allocated. The map keeps its contents and stays usable.
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), TableError> {
        self.table.try_reserve(additional)
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the map did not have this key present, `None` is returned.
    /// If the map did have this key present, the value is updated, and the old
    /// value is returned. The stored key is kept and the new one is dropped.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use chain_hash::HashMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let mut map = HashMap::with_hasher(SimpleHasher);
    /// assert_eq!(map.insert(37, "a"), None);
    /// assert_eq!(map.insert(37, "b"), Some("a"));
    /// assert_eq!(map.get(&37), Some(&"b"));
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.table.grow_if_needed();
        let hash = self.hash_builder.hash_one(&key);
        if let Some(index) = self.table.find(hash, |k| k == &key) {
            let node = self.table.node_mut(index);
            return Some(core::mem::replace(&mut node.value, value));
        }
        self.table.push_front(hash, key, value);
        None
    }

    /// Inserts a key-value pair into the map, reporting allocation failure
    /// instead of aborting.
    ///
    /// Behaves like [`insert`](HashMap::insert) on success.
    ///
    /// # Errors
    ///
    /// Returns an error if growing the bucket array or allocating entry
    /// storage fails. The insert is abandoned and the map keeps its previous
    /// contents.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use chain_hash::HashMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let mut map = HashMap::with_hasher(SimpleHasher);
    /// assert_eq!(map.try_insert(37, "a")?, None);
    /// assert_eq!(map.try_insert(37, "b")?, Some("a"));
    /// # Ok::<(), chain_hash::TableError>(())
    /// ```
    pub fn try_insert(&mut self, key: K, value: V) -> Result<Option<V>, TableError> {
        self.table.try_grow_if_needed()?;
        let hash = self.hash_builder.hash_one(&key);
        if let Some(index) = self.table.find(hash, |k| k == &key) {
            let node = self.table.node_mut(index);
            return Ok(Some(core::mem::replace(&mut node.value, value)));
        }
        self.table.try_reserve_slot()?;
        self.table.push_front(hash, key, value);
        Ok(None)
    }

    /// Returns a reference to the value corresponding to the key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use chain_hash::HashMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let mut map = HashMap::with_hasher(SimpleHasher);
    /// map.insert(1, "a");
    /// assert_eq!(map.get(&1), Some(&"a"));
    /// assert_eq!(map.get(&2), None);
    /// ```
    pub fn get(&self, key: &K) -> Option<&V> {
        let hash = self.hash_builder.hash_one(key);
        self.table
            .find(hash, |k| k == key)
            .map(|index| &self.table.node(index).value)
    }

    /// Returns a mutable reference to the value corresponding to the key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use chain_hash::HashMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let mut map = HashMap::with_hasher(SimpleHasher);
    /// map.insert(1, "a");
    /// if let Some(x) = map.get_mut(&1) {
    ///     *x = "b";
    /// }
    /// assert_eq!(map.get(&1), Some(&"b"));
    /// ```
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let hash = self.hash_builder.hash_one(key);
        let index = self.table.find(hash, |k| k == key)?;
        Some(&mut self.table.node_mut(index).value)
    }

    /// Returns `true` if the map contains a value for the specified key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use chain_hash::HashMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let mut map = HashMap::with_hasher(SimpleHasher);
    /// map.insert(1, "a");
    /// assert!(map.contains_key(&1));
    /// assert!(!map.contains_key(&2));
    /// ```
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Removes a key from the map, returning the value at the key if the key
    /// was previously in the map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use chain_hash::HashMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let mut map = HashMap::with_hasher(SimpleHasher);
    /// map.insert(1, "a");
    /// assert_eq!(map.remove(&1), Some("a"));
    /// assert_eq!(map.remove(&1), None);
    /// ```
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let hash = self.hash_builder.hash_one(key);
        self.table.remove(hash, |k| k == key).map(|(_, value)| value)
    }

    /// Removes a key from the map, returning the stored key and value if the
    /// key was previously in the map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use chain_hash::HashMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let mut map = HashMap::with_hasher(SimpleHasher);
    /// map.insert(1, "a");
    /// assert_eq!(map.remove_entry(&1), Some((1, "a")));
    /// assert_eq!(map.remove_entry(&1), None);
    /// ```
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        let hash = self.hash_builder.hash_one(key);
        self.table.remove(hash, |k| k == key)
    }

    /// Gets the given key's corresponding entry in the map for in-place
    /// manipulation.
    ///
    /// The key is hashed once; inserting through the returned entry does not
    /// hash it again. At the load factor this call grows the bucket array
    /// before looking the key up, even if the entry turns out occupied.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use chain_hash::HashMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let mut map = HashMap::with_hasher(SimpleHasher);
    ///
    /// map.entry(1).or_insert("a");
    /// map.entry(2).or_insert("b");
    ///
    /// assert_eq!(map.get(&1), Some(&"a"));
    /// assert_eq!(map.get(&2), Some(&"b"));
    /// ```
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V> {
        self.table.grow_if_needed();
        let hash = self.hash_builder.hash_one(&key);
        match self.table.find(hash, |k| k == &key) {
            Some(index) => Entry::Occupied(OccupiedEntry {
                table: &mut self.table,
                index,
            }),
            None => Entry::Vacant(VacantEntry {
                table: &mut self.table,
                hash,
                key,
            }),
        }
    }

    /// Returns an iterator over the key-value pairs of the map.
    ///
    /// The iterator yields `(&K, &V)` pairs in an arbitrary order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use chain_hash::HashMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let mut map = HashMap::with_hasher(SimpleHasher);
    /// map.insert(1, "a");
    /// map.insert(2, "b");
    ///
    /// for (key, value) in map.iter() {
    ///     println!("Key: {}, Value: {}", key, value);
    /// }
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.table.slots.iter(),
        }
    }

    /// Returns an iterator over the keys of the map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use chain_hash::HashMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let mut map = HashMap::with_hasher(SimpleHasher);
    /// map.insert(1, "a");
    /// map.insert(2, "b");
    ///
    /// let keys: Vec<_> = map.keys().collect();
    /// assert_eq!(keys.len(), 2);
    /// ```
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the values of the map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use chain_hash::HashMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let mut map = HashMap::with_hasher(SimpleHasher);
    /// map.insert(1, "a");
    /// map.insert(2, "b");
    ///
    /// let values: Vec<_> = map.values().collect();
    /// assert_eq!(values.len(), 2);
    /// ```
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Returns an iterator that removes and yields all key-value pairs from the
    /// map.
    ///
    /// After calling `drain()`, the map will be empty. The allocated capacity
    /// is preserved.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use chain_hash::HashMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let mut map = HashMap::with_hasher(SimpleHasher);
    /// map.insert(1, "a");
    /// map.insert(2, "b");
    ///
    /// let pairs: Vec<_> = map.drain().collect();
    /// assert!(map.is_empty());
    /// assert_eq!(pairs.len(), 2);
    /// ```
    pub fn drain(&mut self) -> Drain<'_, K, V> {
        Drain {
            inner: self.table.drain(),
        }
    }

    /// Returns the distribution of chain lengths across the bucket array.
    ///
    /// Index `i` of the returned vector holds the number of buckets whose
    /// chain is exactly `i` entries long. Long chains point at a hasher that
    /// maps many keys to the same buckets.
    #[cfg(feature = "stats")]
    pub fn chain_histogram(&self) -> Vec<usize> {
        self.table.chain_histogram()
    }

    /// Returns summary statistics about bucket occupancy and chain lengths.
    #[cfg(feature = "stats")]
    pub fn chain_stats(&self) -> ChainStats {
        self.table.chain_stats()
    }
}

impl<K, V, S> HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    /// Creates a new hash map using the default hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use chain_hash::HashMap;
    /// #
    /// # #[derive(Default)]
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let map: HashMap<i32, String, SimpleHasher> = HashMap::new();
    /// assert!(map.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::with_hasher(S::default())
    }

    /// Creates a new hash map with the specified capacity using the default
    /// hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use chain_hash::HashMap;
    /// #
    /// # #[derive(Default)]
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let map: HashMap<i32, String, SimpleHasher> = HashMap::with_capacity(100);
    /// assert!(map.capacity() >= 100);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, S::default())
    }
}

impl<K, V, S> Default for HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

/// A view into a single entry in the map, which may either be vacant or
/// occupied.
///
/// This enum is constructed from the [`entry`] method on [`HashMap`].
///
/// [`entry`]: HashMap::entry
pub enum Entry<'a, K, V> {
    /// A vacant entry.
    Vacant(VacantEntry<'a, K, V>),
    /// An occupied entry.
    Occupied(OccupiedEntry<'a, K, V>),
}

impl<'a, K, V> Entry<'a, K, V> {
    /// Inserts a default value if the entry is vacant and returns a mutable
    /// reference.
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts a value computed from a closure if the entry is vacant and
    /// returns a mutable reference.
    pub fn or_insert_with<F>(self, default: F) -> &'a mut V
    where
        F: FnOnce() -> V,
    {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Provides in-place mutable access to an occupied entry before any
    /// potential inserts.
    pub fn and_modify<F>(self, f: F) -> Self
    where
        F: FnOnce(&mut V),
    {
        match self {
            Entry::Occupied(mut entry) => {
                f(entry.get_mut());
                Entry::Occupied(entry)
            }
            Entry::Vacant(entry) => Entry::Vacant(entry),
        }
    }

    /// Returns a reference to this entry's key.
    pub fn key(&self) -> &K {
        match self {
            Entry::Occupied(entry) => entry.key(),
            Entry::Vacant(entry) => entry.key(),
        }
    }
}

impl<'a, K, V> Entry<'a, K, V>
where
    V: Default,
{
    /// Inserts the default value if the entry is vacant and returns a mutable
    /// reference.
    pub fn or_default(self) -> &'a mut V {
        self.or_insert_with(Default::default)
    }
}

/// A view into a vacant entry in the map.
pub struct VacantEntry<'a, K, V> {
    table: &'a mut Table<K, V>,
    hash: u64,
    key: K,
}

impl<'a, K, V> VacantEntry<'a, K, V> {
    /// Gets a reference to the key that would be used when inserting a value.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Take ownership of the key.
    pub fn into_key(self) -> K {
        self.key
    }

    /// Inserts the value into the map and returns a mutable reference to it.
    pub fn insert(self, value: V) -> &'a mut V {
        let VacantEntry { table, hash, key } = self;
        let index = table.push_front(hash, key, value);
        &mut table.node_mut(index).value
    }
}

/// A view into an occupied entry in the map.
pub struct OccupiedEntry<'a, K, V> {
    table: &'a mut Table<K, V>,
    index: usize,
}

impl<'a, K, V> OccupiedEntry<'a, K, V> {
    /// Gets a reference to the key in the entry.
    pub fn key(&self) -> &K {
        &self.table.node(self.index).key
    }

    /// Gets a reference to the value in the entry.
    pub fn get(&self) -> &V {
        &self.table.node(self.index).value
    }

    /// Gets a mutable reference to the value in the entry.
    pub fn get_mut(&mut self) -> &mut V {
        &mut self.table.node_mut(self.index).value
    }

    /// Converts the entry into a mutable reference to the value.
    pub fn into_mut(self) -> &'a mut V {
        &mut self.table.node_mut(self.index).value
    }

    /// Inserts a value into the entry and returns the old value.
    pub fn insert(&mut self, value: V) -> V {
        core::mem::replace(self.get_mut(), value)
    }

    /// Removes the entry from the map and returns the value.
    pub fn remove(self) -> V {
        self.remove_entry().1
    }

    /// Removes the entry from the map and returns the key and value.
    ///
    /// Like [`HashMap::remove`], this may shrink the bucket array.
    pub fn remove_entry(self) -> (K, V) {
        self.table.remove_at(self.index)
    }
}

/// An iterator over the key-value pairs of a `HashMap`.
pub struct Iter<'a, K, V> {
    inner: core::slice::Iter<'a, Slot<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Slot::Occupied(node) => return Some((&node.key, &node.value)),
                Slot::Vacant { .. } => {}
            }
        }
    }
}

/// An iterator over the keys of a `HashMap`.
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }
}

/// An iterator over the values of a `HashMap`.
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }
}

/// A draining iterator over the key-value pairs of a `HashMap`.
///
/// Pairs not consumed by the time the iterator is dropped are dropped with
/// it.
pub struct Drain<'a, K, V> {
    inner: alloc::vec::Drain<'a, Slot<K, V>>,
}

impl<'a, K, V> Iterator for Drain<'a, K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Slot::Occupied(node) => return Some((node.key, node.value)),
                Slot::Vacant { .. } => {}
            }
        }
    }
}

/// Summary statistics about bucket occupancy and chain lengths.
///
/// Returned by [`HashMap::chain_stats`].
#[cfg(feature = "stats")]
#[derive(Debug, Clone, Copy)]
pub struct ChainStats {
    /// Number of entries in the map.
    pub len: usize,
    /// Number of buckets in the map.
    pub capacity: usize,
    /// Number of buckets with a non-empty chain.
    pub occupied_buckets: usize,
    /// Length of the longest chain.
    pub max_chain: usize,
    /// Entries divided by buckets.
    pub load_factor: f64,
    /// Entries divided by occupied buckets.
    pub average_chain: f64,
}

#[cfg(feature = "stats")]
impl ChainStats {
    /// Pretty-prints the statistics to stdout.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("entries:          {}", self.len);
        println!("buckets:          {}", self.capacity);
        println!("occupied buckets: {}", self.occupied_buckets);
        println!("max chain:        {}", self.max_chain);
        println!("load factor:      {:.3}", self.load_factor);
        println!("avg chain:        {:.3}", self.average_chain);
    }
}

/// A single entry: the owned pair, the cached hash of the key, and the index
/// of the next entry in the same bucket's chain.
#[derive(Clone)]
struct Node<K, V> {
    hash: u64,
    key: K,
    value: V,
    next: usize,
}

#[derive(Clone)]
enum Slot<K, V> {
    Occupied(Node<K, V>),
    Vacant { next_free: usize },
}

/// Hasher-free storage: a bucket-head array over an index-linked arena of
/// entries.
///
/// Callers hash keys themselves and pass the hash in; the table stores it and
/// compares cached hashes before calling the equality closure. `buckets`
/// holds the slot index of each chain head (or `NIL`), `slots` holds the
/// entries, and vacated slots are recycled through an intrusive free list
/// starting at `free_head`.
#[derive(Clone)]
struct Table<K, V> {
    buckets: Vec<usize>,
    slots: Vec<Slot<K, V>>,
    free_head: usize,
    len: usize,
}

impl<K, V> Table<K, V> {
    fn with_capacity(capacity: usize) -> Self {
        let capacity = normalize_capacity(capacity).expect("capacity overflow");
        Self {
            buckets: alloc::vec![NIL; capacity],
            slots: Vec::new(),
            free_head: NIL,
            len: 0,
        }
    }

    fn try_with_capacity(capacity: usize) -> Result<Self, TableError> {
        let capacity = normalize_capacity(capacity).ok_or(TableError::CapacityOverflow)?;
        Ok(Self {
            buckets: try_bucket_array(capacity)?,
            slots: Vec::new(),
            free_head: NIL,
            len: 0,
        })
    }

    #[inline(always)]
    fn bucket_of(&self, hash: u64) -> usize {
        hash as usize & (self.buckets.len() - 1)
    }

    fn node(&self, index: usize) -> &Node<K, V> {
        match &self.slots[index] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => unreachable!(),
        }
    }

    fn node_mut(&mut self, index: usize) -> &mut Node<K, V> {
        match &mut self.slots[index] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => unreachable!(),
        }
    }

    /// Walks the chain for `hash`, comparing cached hashes before keys.
    fn find(&self, hash: u64, mut eq: impl FnMut(&K) -> bool) -> Option<usize> {
        let mut current = self.buckets[self.bucket_of(hash)];
        while current != NIL {
            let node = self.node(current);
            if node.hash == hash && eq(&node.key) {
                return Some(current);
            }
            current = node.next;
        }
        None
    }

    /// Links a new entry at the head of its chain and returns its slot index.
    ///
    /// The caller has already established that no entry with this key exists
    /// and that the load factor allows the insert.
    fn push_front(&mut self, hash: u64, key: K, value: V) -> usize {
        let bucket = self.bucket_of(hash);
        let node = Node {
            hash,
            key,
            value,
            next: self.buckets[bucket],
        };
        let index = match self.free_head {
            NIL => {
                self.slots.push(Slot::Occupied(node));
                self.slots.len() - 1
            }
            free => {
                self.free_head = match &self.slots[free] {
                    Slot::Vacant { next_free } => *next_free,
                    Slot::Occupied(_) => unreachable!(),
                };
                self.slots[free] = Slot::Occupied(node);
                free
            }
        };
        self.buckets[bucket] = index;
        self.len += 1;
        index
    }

    /// Removes the entry matching `hash` and `eq` from its chain, if any.
    fn remove(&mut self, hash: u64, mut eq: impl FnMut(&K) -> bool) -> Option<(K, V)> {
        let bucket = self.bucket_of(hash);
        let mut prev = NIL;
        let mut current = self.buckets[bucket];
        while current != NIL {
            let node = self.node(current);
            let next = node.next;
            if node.hash == hash && eq(&node.key) {
                self.unlink(bucket, prev, next);
                let pair = self.vacate(current);
                self.maybe_shrink();
                return Some(pair);
            }
            prev = current;
            current = next;
        }
        None
    }

    /// Removes the entry at `index`, walking its chain to fix the links.
    fn remove_at(&mut self, index: usize) -> (K, V) {
        let bucket = self.bucket_of(self.node(index).hash);
        let mut prev = NIL;
        let mut current = self.buckets[bucket];
        while current != index {
            debug_assert!(current != NIL);
            prev = current;
            current = self.node(current).next;
        }
        let next = self.node(index).next;
        self.unlink(bucket, prev, next);
        let pair = self.vacate(index);
        self.maybe_shrink();
        pair
    }

    fn unlink(&mut self, bucket: usize, prev: usize, next: usize) {
        if prev == NIL {
            self.buckets[bucket] = next;
        } else {
            self.node_mut(prev).next = next;
        }
    }

    /// Moves the entry out of `index` and puts the slot on the free list.
    fn vacate(&mut self, index: usize) -> (K, V) {
        let slot = core::mem::replace(
            &mut self.slots[index],
            Slot::Vacant {
                next_free: self.free_head,
            },
        );
        self.free_head = index;
        self.len -= 1;
        match slot {
            Slot::Occupied(node) => (node.key, node.value),
            Slot::Vacant { .. } => unreachable!(),
        }
    }

    /// Doubles the bucket array if the pending insert would reach the load
    /// factor.
    fn grow_if_needed(&mut self) {
        if self.len >= grow_threshold(self.buckets.len()) {
            let capacity = self
                .buckets
                .len()
                .checked_mul(2)
                .expect("capacity overflow");
            self.rebucket(alloc::vec![NIL; capacity]);
        }
    }

    fn try_grow_if_needed(&mut self) -> Result<(), TableError> {
        if self.len >= grow_threshold(self.buckets.len()) {
            let capacity = self
                .buckets
                .len()
                .checked_mul(2)
                .ok_or(TableError::CapacityOverflow)?;
            self.rebucket(try_bucket_array(capacity)?);
        }
        Ok(())
    }

    /// Ensures the next `push_front` cannot fail to allocate a slot.
    fn try_reserve_slot(&mut self) -> Result<(), TableError> {
        if self.free_head == NIL {
            self.slots
                .try_reserve(1)
                .map_err(|source| TableError::Entries { source })?;
        }
        Ok(())
    }

    /// Halves the bucket array after a removal that left the table at or
    /// below the shrink threshold.
    ///
    /// Shrinking is opportunistic: if the smaller array cannot be allocated,
    /// the table stays at its current capacity and the removal stands.
    fn maybe_shrink(&mut self) {
        let capacity = self.buckets.len();
        if capacity > MIN_CAPACITY && self.len <= shrink_threshold(capacity) {
            if let Ok(buckets) = try_bucket_array(capacity / 2) {
                self.rebucket(buckets);
            }
        }
    }

    /// Relinks every live entry into `buckets` from its cached hash.
    ///
    /// Entries keep their slots; only the chain links change. Keys are never
    /// re-hashed, and within a bucket the resulting order is arbitrary.
    fn rebucket(&mut self, mut buckets: Vec<usize>) {
        debug_assert!(buckets.len() >= MIN_CAPACITY && buckets.len().is_power_of_two());
        let mask = buckets.len() - 1;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Slot::Occupied(node) = slot {
                node.next = core::mem::replace(&mut buckets[node.hash as usize & mask], index);
            }
        }
        self.buckets = buckets;
    }

    /// Smallest capacity in the doubling family that keeps `required` entries
    /// under the load factor.
    fn capacity_for(&self, required: usize) -> Option<usize> {
        let mut capacity = self.buckets.len();
        while required > grow_threshold(capacity) {
            capacity = capacity.checked_mul(2)?;
        }
        Some(capacity)
    }

    fn reserve(&mut self, additional: usize) {
        let required = self.len.checked_add(additional).expect("capacity overflow");
        let capacity = self.capacity_for(required).expect("capacity overflow");
        self.slots.reserve(additional);
        if capacity > self.buckets.len() {
            self.rebucket(alloc::vec![NIL; capacity]);
        }
    }

    fn try_reserve(&mut self, additional: usize) -> Result<(), TableError> {
        let required = self
            .len
            .checked_add(additional)
            .ok_or(TableError::CapacityOverflow)?;
        let capacity = self
            .capacity_for(required)
            .ok_or(TableError::CapacityOverflow)?;
        self.slots
            .try_reserve(additional)
            .map_err(|source| TableError::Entries { source })?;
        if capacity > self.buckets.len() {
            self.rebucket(try_bucket_array(capacity)?);
        }
        Ok(())
    }

    fn clear(&mut self) {
        self.slots.clear();
        for head in self.buckets.iter_mut() {
            *head = NIL;
        }
        self.free_head = NIL;
        self.len = 0;
    }

    fn shrink_to_fit(&mut self) {
        let mut capacity = self.buckets.len();
        while capacity > MIN_CAPACITY && self.len <= shrink_threshold(capacity) {
            capacity /= 2;
        }
        if capacity == self.buckets.len() && self.len == self.slots.len() {
            return;
        }
        let mut slots = Vec::with_capacity(self.len);
        slots.extend(
            self.slots
                .drain(..)
                .filter(|slot| matches!(slot, Slot::Occupied(_))),
        );
        self.slots = slots;
        self.free_head = NIL;
        self.rebucket(alloc::vec![NIL; capacity]);
    }

    /// Empties every bucket and hands the slots to a draining iterator.
    fn drain(&mut self) -> alloc::vec::Drain<'_, Slot<K, V>> {
        for head in self.buckets.iter_mut() {
            *head = NIL;
        }
        self.free_head = NIL;
        self.len = 0;
        self.slots.drain(..)
    }
}

#[cfg(feature = "stats")]
impl<K, V> Table<K, V> {
    fn chain_length(&self, head: usize) -> usize {
        let mut length = 0;
        let mut current = head;
        while current != NIL {
            length += 1;
            current = self.node(current).next;
        }
        length
    }

    fn chain_histogram(&self) -> Vec<usize> {
        let mut histogram = Vec::new();
        for &head in self.buckets.iter() {
            let length = self.chain_length(head);
            if histogram.len() <= length {
                histogram.resize(length + 1, 0);
            }
            histogram[length] += 1;
        }
        histogram
    }

    fn chain_stats(&self) -> ChainStats {
        let mut occupied_buckets = 0;
        let mut max_chain = 0;
        for &head in self.buckets.iter() {
            let length = self.chain_length(head);
            if length > 0 {
                occupied_buckets += 1;
            }
            max_chain = max_chain.max(length);
        }
        ChainStats {
            len: self.len,
            capacity: self.buckets.len(),
            occupied_buckets,
            max_chain,
            load_factor: self.len as f64 / self.buckets.len() as f64,
            average_chain: if occupied_buckets == 0 {
                0.0
            } else {
                self.len as f64 / occupied_buckets as f64
            },
        }
    }
}

fn try_bucket_array(capacity: usize) -> Result<Vec<usize>, TableError> {
    let mut buckets = Vec::new();
    buckets
        .try_reserve_exact(capacity)
        .map_err(|source| TableError::Buckets { capacity, source })?;
    buckets.resize(capacity, NIL);
    Ok(buckets)
}

#[cfg(test)]
mod tests {
    use core::hash::Hasher;

    use std::collections::HashSet;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use rand::TryRngCore;
    use rand::rngs::OsRng;

    use super::*;

    #[derive(Clone)]
    struct SipHashBuilder {
        k1: u64,
        k2: u64,
    }

    impl Default for SipHashBuilder {
        fn default() -> Self {
            SipHashBuilder {
                k1: OsRng.try_next_u64().unwrap_or(0),
                k2: OsRng.try_next_u64().unwrap_or(0),
            }
        }
    }

    impl BuildHasher for SipHashBuilder {
        type Hasher = siphasher::sip::SipHasher;

        fn build_hasher(&self) -> Self::Hasher {
            siphasher::sip::SipHasher::new_with_keys(self.k1, self.k2)
        }
    }

    struct Counted {
        id: u32,
        drops: Arc<AtomicUsize>,
    }

    impl Counted {
        fn new(id: u32, drops: &Arc<AtomicUsize>) -> Self {
            Counted {
                id,
                drops: Arc::clone(drops),
            }
        }
    }

    impl Drop for Counted {
        fn drop(&mut self) {
            self.drops.fetch_add(1, Ordering::Relaxed);
        }
    }

    impl Hash for Counted {
        fn hash<H: Hasher>(&self, state: &mut H) {
            self.id.hash(state);
        }
    }

    impl PartialEq for Counted {
        fn eq(&self, other: &Self) -> bool {
            self.id == other.id
        }
    }

    impl Eq for Counted {}

    struct CountingHasher {
        inner: siphasher::sip::SipHasher,
        hashes: Arc<AtomicUsize>,
    }

    impl Hasher for CountingHasher {
        fn finish(&self) -> u64 {
            self.hashes.fetch_add(1, Ordering::Relaxed);
            self.inner.finish()
        }

        fn write(&mut self, bytes: &[u8]) {
            self.inner.write(bytes);
        }
    }

    struct CountingBuilder {
        hashes: Arc<AtomicUsize>,
    }

    impl BuildHasher for CountingBuilder {
        type Hasher = CountingHasher;

        fn build_hasher(&self) -> Self::Hasher {
            CountingHasher {
                inner: siphasher::sip::SipHasher::new(),
                hashes: Arc::clone(&self.hashes),
            }
        }
    }

    #[test]
    fn test_new_and_with_hasher() {
        let map: HashMap<i32, String, SipHashBuilder> = HashMap::new();
        assert_eq!(map.len(), 0);
        assert!(map.is_empty());

        let map: HashMap<i32, String, _> = HashMap::with_hasher(SipHashBuilder::default());
        assert_eq!(map.len(), 0);
        assert!(map.is_empty());
    }

    #[test]
    fn test_with_capacity() {
        let map: HashMap<i32, String, SipHashBuilder> = HashMap::with_capacity(100);
        assert!(map.capacity() >= 100);
        assert_eq!(map.len(), 0);
    }

    #[test]
    fn test_capacity_rounding() {
        let map: HashMap<i32, i32, SipHashBuilder> = HashMap::with_capacity(0);
        assert_eq!(map.capacity(), 16);

        let map: HashMap<i32, i32, SipHashBuilder> = HashMap::with_capacity(16);
        assert_eq!(map.capacity(), 16);

        let map: HashMap<i32, i32, SipHashBuilder> = HashMap::with_capacity(17);
        assert_eq!(map.capacity(), 32);

        let map: HashMap<i32, i32, SipHashBuilder> = HashMap::with_capacity(20);
        assert_eq!(map.capacity(), 32);

        let map: HashMap<i32, i32, SipHashBuilder> = HashMap::with_capacity(100);
        assert_eq!(map.capacity(), 128);
    }

    #[test]
    fn test_try_with_capacity() {
        let map =
            HashMap::<i32, i32, _>::try_with_capacity_and_hasher(100, SipHashBuilder::default());
        assert_eq!(map.unwrap().capacity(), 128);

        let overflow = HashMap::<i32, i32, _>::try_with_capacity_and_hasher(
            usize::MAX,
            SipHashBuilder::default(),
        );
        assert!(matches!(overflow, Err(TableError::CapacityOverflow)));

        let too_large = HashMap::<i32, i32, _>::try_with_capacity_and_hasher(
            1_usize << 62,
            SipHashBuilder::default(),
        );
        assert!(matches!(too_large, Err(TableError::Buckets { .. })));
    }

    #[test]
    fn test_with_capacity_hint_and_updates() {
        let mut map = HashMap::with_capacity_and_hasher(20, SipHashBuilder::default());
        assert_eq!(map.capacity(), 32);

        map.insert(10, "ten".to_string());
        map.insert(7, "seven".to_string());
        map.insert(11, "eleven".to_string());
        map.insert(10, "ten again".to_string());

        assert_eq!(map.len(), 3);
        assert_eq!(map.get(&10), Some(&"ten again".to_string()));
        assert_eq!(map.get(&7), Some(&"seven".to_string()));
        assert_eq!(map.get(&11), Some(&"eleven".to_string()));
    }

    #[test]
    fn test_insert_and_get() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());

        assert_eq!(map.insert(1, "one".to_string()), None);
        assert_eq!(map.insert(2, "two".to_string()), None);
        assert_eq!(map.len(), 2);

        assert_eq!(map.get(&1), Some(&"one".to_string()));
        assert_eq!(map.get(&2), Some(&"two".to_string()));
        assert_eq!(map.get(&3), None);

        assert_eq!(map.insert(1, "uno".to_string()), Some("one".to_string()));
        assert_eq!(map.get(&1), Some(&"uno".to_string()));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_get_mut() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "one".to_string());

        if let Some(value) = map.get_mut(&1) {
            value.push_str("_modified");
        }

        assert_eq!(map.get(&1), Some(&"one_modified".to_string()));
        assert_eq!(map.get_mut(&2), None);
    }

    #[test]
    fn test_contains_key() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "one".to_string());

        assert!(map.contains_key(&1));
        assert!(!map.contains_key(&2));
    }

    #[test]
    fn test_remove() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "one".to_string());
        map.insert(2, "two".to_string());

        assert_eq!(map.remove(&1), Some("one".to_string()));
        assert_eq!(map.remove(&1), None);
        assert_eq!(map.len(), 1);
        assert!(!map.contains_key(&1));
        assert!(map.contains_key(&2));
    }

    #[test]
    fn test_remove_entry() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "one".to_string());

        assert_eq!(map.remove_entry(&1), Some((1, "one".to_string())));
        assert_eq!(map.remove_entry(&1), None);
        assert!(map.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "one".to_string());
        map.insert(2, "two".to_string());
        map.insert(3, "three".to_string());
        assert_eq!(map.len(), 3);

        map.clear();
        assert_eq!(map.len(), 0);
        assert!(map.is_empty());
        assert_eq!(map.get(&1), None);

        map.insert(1, "one".to_string());
        assert_eq!(map.get(&1), Some(&"one".to_string()));
    }

    #[test]
    fn test_reserve() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        map.reserve(1000);
        let capacity = map.capacity();
        assert!(capacity >= 1000);

        for i in 0..1000 {
            map.insert(i, i * 2);
        }
        assert_eq!(map.capacity(), capacity);
        for i in 0..1000 {
            assert_eq!(map.get(&i), Some(&(i * 2)));
        }
    }

    #[test]
    fn test_try_reserve() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, 1);

        assert!(map.try_reserve(100).is_ok());
        let capacity = map.capacity();
        assert!(capacity >= 128);
        for i in 2..=100 {
            map.insert(i, i);
        }
        assert_eq!(map.capacity(), capacity);

        assert!(matches!(
            map.try_reserve(usize::MAX),
            Err(TableError::CapacityOverflow)
        ));
        assert_eq!(map.len(), 100);
        assert_eq!(map.get(&1), Some(&1));
    }

    #[test]
    fn test_try_insert() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        assert_eq!(map.try_insert(1, "one".to_string()).unwrap(), None);
        assert_eq!(
            map.try_insert(1, "uno".to_string()).unwrap(),
            Some("one".to_string())
        );
        assert_eq!(map.get(&1), Some(&"uno".to_string()));

        for i in 2..50 {
            map.try_insert(i, "x".to_string()).unwrap();
        }
        assert_eq!(map.len(), 49);
        assert_eq!(map.capacity(), 128);
    }

    #[test]
    fn test_growth_at_load_factor() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        assert_eq!(map.capacity(), 16);

        for i in 0..11 {
            map.insert(i, i);
        }
        assert_eq!(map.capacity(), 16);

        map.insert(11, 11);
        assert_eq!(map.capacity(), 32);
        assert_eq!(map.len(), 12);

        for i in 12..22 {
            map.insert(i, i);
        }
        assert_eq!(map.capacity(), 32);

        map.insert(22, 22);
        assert_eq!(map.capacity(), 64);

        // Updates do not add entries, but one arriving at the load factor
        // still grows the bucket array before the chain is searched.
        for i in 23..44 {
            map.insert(i, i);
        }
        assert_eq!(map.len(), 44);
        assert_eq!(map.capacity(), 64);

        map.insert(0, 100);
        assert_eq!(map.len(), 44);
        assert_eq!(map.capacity(), 128);
        assert_eq!(map.get(&0), Some(&100));
    }

    #[test]
    fn test_shrink_on_remove() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        for i in 0..23 {
            map.insert(i, i);
        }
        assert_eq!(map.capacity(), 64);

        for i in 0..6 {
            map.remove(&i);
        }
        assert_eq!(map.capacity(), 64);

        map.remove(&6);
        assert_eq!(map.len(), 16);
        assert_eq!(map.capacity(), 32);

        for i in 7..15 {
            map.remove(&i);
        }
        assert_eq!(map.len(), 8);
        assert_eq!(map.capacity(), 16);

        for i in 15..23 {
            map.remove(&i);
        }
        assert!(map.is_empty());
        assert_eq!(map.capacity(), 16);

        for i in 0..23 {
            assert_eq!(map.get(&i), None);
        }
    }

    #[test]
    fn test_shrink_to_fit() {
        let mut map = HashMap::with_capacity_and_hasher(1000, SipHashBuilder::default());
        for i in 0..100 {
            map.insert(i, i);
        }
        assert_eq!(map.capacity(), 1024);

        map.shrink_to_fit();
        assert_eq!(map.capacity(), 256);
        for i in 0..100 {
            assert_eq!(map.get(&i), Some(&i));
        }

        for i in 0..95 {
            map.remove(&i);
        }
        map.shrink_to_fit();
        assert_eq!(map.capacity(), 16);
        assert_eq!(map.len(), 5);
        for i in 95..100 {
            assert_eq!(map.get(&i), Some(&i));
        }
    }

    #[test]
    fn test_entry_api() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());

        *map.entry(1).or_insert(10) += 5;
        assert_eq!(map.get(&1), Some(&15));

        *map.entry(1).or_insert(100) += 5;
        assert_eq!(map.get(&1), Some(&20));

        let value = map.entry(2).or_insert_with(|| 42);
        assert_eq!(*value, 42);

        map.entry(3).and_modify(|v| *v += 1).or_insert(0);
        assert_eq!(map.get(&3), Some(&0));

        map.entry(3).and_modify(|v| *v += 1).or_insert(0);
        assert_eq!(map.get(&3), Some(&1));
    }

    #[test]
    fn test_entry_or_default() {
        let mut map: HashMap<i32, i32, _> = HashMap::with_hasher(SipHashBuilder::default());

        let value = map.entry(1).or_default();
        assert_eq!(*value, 0);

        *map.entry(1).or_default() += 10;
        assert_eq!(map.get(&1), Some(&10));
    }

    #[test]
    fn test_occupied_entry() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "one".to_string());

        match map.entry(1) {
            Entry::Occupied(mut entry) => {
                assert_eq!(entry.key(), &1);
                assert_eq!(entry.get(), &"one".to_string());

                *entry.get_mut() = "uno".to_string();
                assert_eq!(entry.get(), &"uno".to_string());

                let old = entry.insert("ein".to_string());
                assert_eq!(old, "uno".to_string());
            }
            Entry::Vacant(_) => panic!("entry should be occupied"),
        }

        assert_eq!(map.get(&1), Some(&"ein".to_string()));

        match map.entry(1) {
            Entry::Occupied(entry) => {
                let (key, value) = entry.remove_entry();
                assert_eq!(key, 1);
                assert_eq!(value, "ein".to_string());
            }
            Entry::Vacant(_) => panic!("entry should be occupied"),
        }

        assert!(!map.contains_key(&1));
    }

    #[test]
    fn test_vacant_entry() {
        let mut map: HashMap<i32, String, _> = HashMap::with_hasher(SipHashBuilder::default());

        match map.entry(1) {
            Entry::Vacant(entry) => {
                assert_eq!(entry.key(), &1);
                let value = entry.insert("one".to_string());
                assert_eq!(value, &"one".to_string());
            }
            Entry::Occupied(_) => panic!("entry should be vacant"),
        }

        assert_eq!(map.get(&1), Some(&"one".to_string()));

        match map.entry(2) {
            Entry::Vacant(entry) => {
                assert_eq!(entry.into_key(), 2);
            }
            Entry::Occupied(_) => panic!("entry should be vacant"),
        }

        assert!(!map.contains_key(&2));
    }

    #[test]
    fn test_iterators() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "one".to_string());
        map.insert(2, "two".to_string());
        map.insert(3, "three".to_string());

        let pairs: HashSet<(i32, String)> = map.iter().map(|(k, v)| (*k, v.clone())).collect();
        assert_eq!(pairs.len(), 3);
        assert!(pairs.contains(&(1, "one".to_string())));
        assert!(pairs.contains(&(2, "two".to_string())));
        assert!(pairs.contains(&(3, "three".to_string())));

        let keys: HashSet<i32> = map.keys().copied().collect();
        assert_eq!(keys, [1, 2, 3].into_iter().collect());

        let values: HashSet<String> = map.values().cloned().collect();
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn test_drain() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "one".to_string());
        map.insert(2, "two".to_string());

        let drained: HashSet<(i32, String)> = map.drain().collect();
        assert_eq!(drained.len(), 2);
        assert!(drained.contains(&(1, "one".to_string())));
        assert!(drained.contains(&(2, "two".to_string())));

        assert!(map.is_empty());
        map.insert(3, "three".to_string());
        assert_eq!(map.get(&3), Some(&"three".to_string()));
    }

    #[test]
    fn test_multiple_insertions() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        for i in 0..100 {
            map.insert(i, format!("value_{}", i));
        }

        assert_eq!(map.len(), 100);
        for i in 0..100 {
            assert_eq!(map.get(&i), Some(&format!("value_{}", i)));
        }
    }

    #[test]
    fn test_collision_handling() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());

        for i in 0..1000 {
            map.insert(i, i * 2);
        }
        assert_eq!(map.len(), 1000);
        for i in 0..1000 {
            assert_eq!(map.get(&i), Some(&(i * 2)));
        }

        for i in (0..1000).step_by(2) {
            assert_eq!(map.remove(&i), Some(i * 2));
        }
        assert_eq!(map.len(), 500);

        for i in 0..1000 {
            if i % 2 == 0 {
                assert_eq!(map.get(&i), None);
            } else {
                assert_eq!(map.get(&i), Some(&(i * 2)));
            }
        }
    }

    #[test]
    fn test_drop_counts() {
        let key_drops = Arc::new(AtomicUsize::new(0));
        let value_drops = Arc::new(AtomicUsize::new(0));

        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        for id in 0..5 {
            map.insert(Counted::new(id, &key_drops), Counted::new(id, &value_drops));
        }
        assert_eq!(key_drops.load(Ordering::Relaxed), 0);
        assert_eq!(value_drops.load(Ordering::Relaxed), 0);

        // An update keeps the stored key: the incoming duplicate and the old
        // value are dropped.
        map.insert(
            Counted::new(3, &key_drops),
            Counted::new(103, &value_drops),
        );
        assert_eq!(key_drops.load(Ordering::Relaxed), 1);
        assert_eq!(value_drops.load(Ordering::Relaxed), 1);

        let probe_drops = Arc::new(AtomicUsize::new(0));
        let removed = map.remove_entry(&Counted::new(1, &probe_drops));
        assert!(removed.is_some());
        drop(removed);
        assert_eq!(key_drops.load(Ordering::Relaxed), 2);
        assert_eq!(value_drops.load(Ordering::Relaxed), 2);

        drop(map);
        assert_eq!(key_drops.load(Ordering::Relaxed), 6);
        assert_eq!(value_drops.load(Ordering::Relaxed), 6);

        // Pairs a draining iterator never yielded are dropped with it.
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        for id in 0..4 {
            map.insert(Counted::new(id, &key_drops), Counted::new(id, &value_drops));
        }
        let mut drain = map.drain();
        drain.next();
        drop(drain);
        assert_eq!(key_drops.load(Ordering::Relaxed), 10);
        assert_eq!(value_drops.load(Ordering::Relaxed), 10);
        assert!(map.is_empty());

        map.insert(Counted::new(20, &key_drops), Counted::new(20, &value_drops));
        map.insert(Counted::new(21, &key_drops), Counted::new(21, &value_drops));
        map.clear();
        assert_eq!(key_drops.load(Ordering::Relaxed), 12);
        assert_eq!(value_drops.load(Ordering::Relaxed), 12);
    }

    #[test]
    fn test_cached_hash_reuse() {
        let hashes = Arc::new(AtomicUsize::new(0));
        let mut map = HashMap::with_hasher(CountingBuilder {
            hashes: Arc::clone(&hashes),
        });

        // Growing from 16 to 256 buckets relinks every entry without hashing
        // any key again.
        for i in 0..100 {
            map.insert(i, i);
        }
        assert_eq!(map.capacity(), 256);
        assert_eq!(hashes.load(Ordering::Relaxed), 100);

        for i in 0..100 {
            assert_eq!(map.get(&i), Some(&i));
        }
        assert_eq!(hashes.load(Ordering::Relaxed), 200);

        for i in 0..100 {
            assert_eq!(map.remove(&i), Some(i));
        }
        assert_eq!(hashes.load(Ordering::Relaxed), 300);
        assert_eq!(map.capacity(), 16);
    }

    #[test]
    fn test_string_keys() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        map.insert("hello".to_string(), 1);
        map.insert("world".to_string(), 2);

        assert_eq!(map.get(&"hello".to_string()), Some(&1));
        assert_eq!(map.get(&"world".to_string()), Some(&2));
        assert_eq!(map.get(&"missing".to_string()), None);
    }

    #[test]
    fn test_default_trait() {
        let map: HashMap<i32, String, SipHashBuilder> = HashMap::default();
        assert!(map.is_empty());
    }

    #[test]
    fn test_clone() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        for i in 0..20 {
            map.insert(i, i * 10);
        }

        let mut clone = map.clone();
        clone.insert(100, 1000);
        clone.remove(&0);

        assert_eq!(map.len(), 20);
        assert!(map.contains_key(&0));
        assert!(!map.contains_key(&100));

        assert_eq!(clone.len(), 20);
        assert!(!clone.contains_key(&0));
        assert_eq!(clone.get(&100), Some(&1000));
    }

    #[test]
    fn test_debug() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        assert_eq!(format!("{:?}", map), "{}");

        map.insert(1, "one");
        assert_eq!(format!("{:?}", map), r#"{1: "one"}"#);
    }

    #[test]
    fn test_complex_values() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, vec![1, 2, 3]);
        map.insert(2, vec![4, 5, 6]);

        assert_eq!(map.get(&1), Some(&vec![1, 2, 3]));

        if let Some(v) = map.get_mut(&1) {
            v.push(4);
        }
        assert_eq!(map.get(&1), Some(&vec![1, 2, 3, 4]));
    }

    #[cfg(feature = "stats")]
    #[test]
    fn test_chain_statistics() {
        let empty: HashMap<i32, i32, SipHashBuilder> = HashMap::new();
        let stats = empty.chain_stats();
        assert_eq!(stats.occupied_buckets, 0);
        assert_eq!(stats.average_chain, 0.0);

        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        for i in 0..100 {
            map.insert(i, i);
        }

        let histogram = map.chain_histogram();
        assert_eq!(histogram.iter().sum::<usize>(), map.capacity());
        let entries: usize = histogram
            .iter()
            .enumerate()
            .map(|(length, count)| length * count)
            .sum();
        assert_eq!(entries, map.len());

        let stats = map.chain_stats();
        assert_eq!(stats.len, 100);
        assert_eq!(stats.capacity, map.capacity());
        assert!(stats.occupied_buckets > 0);
        assert!(stats.max_chain >= 1);
        assert!((stats.load_factor - 100.0 / map.capacity() as f64).abs() < f64::EPSILON);
    }
}
