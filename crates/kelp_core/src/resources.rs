use slotmap::{new_key_type, Key, KeyData, SlotMap};

use crate::error::{KelpError, KelpResult};
use crate::types::TextureId;

new_key_type! {
    struct TextureKey;
}

/// A live texture together with the size it was created with.
#[derive(Debug)]
pub struct TextureEntry<T> {
    pub texture: T,
    pub width: u32,
    pub height: u32,
}

/// Maps opaque 64-bit ids onto backend textures.
///
/// Ids are slotmap keys in their ffi form. A removed slot bumps its version,
/// so a stale id never resolves again, and the table is cleared rather than
/// replaced between sessions so ids stay unique for the whole process.
#[derive(Debug)]
pub struct ResourceTable<T> {
    textures: SlotMap<TextureKey, TextureEntry<T>>,
}

impl<T> Default for ResourceTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ResourceTable<T> {
    pub fn new() -> Self {
        Self {
            textures: SlotMap::with_key(),
        }
    }

    pub fn insert(&mut self, texture: T, width: u32, height: u32) -> TextureId {
        let key = self.textures.insert(TextureEntry { texture, width, height });
        let id = TextureId::from_raw(key.data().as_ffi());
        tracing::debug!("registered texture {:#x} ({}x{})", id.raw(), width, height);
        id
    }

    pub fn get(&self, id: TextureId) -> KelpResult<&TextureEntry<T>> {
        Self::key_of(id)
            .and_then(|key| self.textures.get(key))
            .ok_or(KelpError::InvalidTextureId(id.raw()))
    }

    pub fn contains(&self, id: TextureId) -> bool {
        self.get(id).is_ok()
    }

    pub fn remove(&mut self, id: TextureId) -> KelpResult<TextureEntry<T>> {
        let entry = Self::key_of(id)
            .and_then(|key| self.textures.remove(key))
            .ok_or(KelpError::InvalidTextureId(id.raw()))?;
        tracing::debug!("released texture {:#x}", id.raw());
        Ok(entry)
    }

    /// Drops every entry. Previously issued ids stay invalid afterwards.
    pub fn clear(&mut self) {
        let released = self.textures.len();
        self.textures.clear();
        if released > 0 {
            tracing::debug!("released {} textures", released);
        }
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    fn key_of(id: TextureId) -> Option<TextureKey> {
        if id.is_screen() {
            return None;
        }
        // from_ffi forces an odd version; reject anything that does not
        // round-trip so a forged id cannot alias a live slot.
        let key = TextureKey::from(KeyData::from_ffi(id.raw()));
        (key.data().as_ffi() == id.raw()).then_some(key)
    }
}
