//! Paired ownership of coin bodies and their proxies.
//!
//! Entries live in a slot arena with a free list, so evicting a coin never
//! shifts the others and a stale [`CoinHandle`] can never reach a coin that
//! later reused its slot. Removal always takes the rigid body out of the
//! physics world and detaches the proxy in the same call.

use std::time::Duration;

use rapier3d::prelude::{ColliderHandle, RigidBodyHandle};

use crate::sink::RenderSink;
use crate::world::PhysicsWorld;

/// Identity of a live coin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoinHandle {
    index: u32,
    generation: u32,
}

impl std::fmt::Display for CoinHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "coin#{}v{}", self.index, self.generation)
    }
}

/// A dynamic coin and the proxy that renders it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoinBody<P> {
    pub body: RigidBodyHandle,
    pub collider: ColliderHandle,
    /// Index into the coin table
    pub coin_type: usize,
    /// Session time at which the coin was spawned
    pub spawned_at: Duration,
    pub proxy: P,
}

#[derive(Debug)]
struct Slot<P> {
    generation: u32,
    coin: Option<CoinBody<P>>,
}

#[derive(Debug)]
pub struct BodyRegistry<P> {
    slots: Vec<Slot<P>>,
    free: Vec<u32>,
    len: usize,
}

impl<P> Default for BodyRegistry<P> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }
}

impl<P: Copy> BodyRegistry<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live coins.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Register a coin whose body and proxy have just been created.
    pub fn add(&mut self, coin: CoinBody<P>) -> CoinHandle {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.coin = Some(coin);
            return CoinHandle {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            coin: Some(coin),
        });
        CoinHandle {
            index,
            generation: 0,
        }
    }

    pub fn get(&self, handle: CoinHandle) -> Option<&CoinBody<P>> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.coin.as_ref()
    }

    pub fn contains(&self, handle: CoinHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Iterate live coins. Order is unspecified.
    pub fn iter(&self) -> impl Iterator<Item = (CoinHandle, &CoinBody<P>)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.coin.as_ref().map(|coin| {
                (
                    CoinHandle {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    coin,
                )
            })
        })
    }

    /// Handles of all live coins.
    pub fn handles(&self) -> Vec<CoinHandle> {
        self.iter().map(|(handle, _)| handle).collect()
    }

    /// Take an entry out without touching the world or the sink.
    fn take(&mut self, handle: CoinHandle) -> Option<CoinBody<P>> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let coin = slot.coin.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.len -= 1;
        Some(coin)
    }

    /// Remove a coin: its rigid body (with collider) leaves the world and
    /// its proxy is detached. Returns the removed entry, or `None` for a
    /// stale handle.
    pub fn remove<S>(
        &mut self,
        handle: CoinHandle,
        world: &mut PhysicsWorld,
        sink: &mut S,
    ) -> Option<CoinBody<P>>
    where
        S: RenderSink<Proxy = P>,
    {
        let coin = self.take(handle)?;
        world.remove_body(coin.body);
        sink.detach(coin.proxy);
        Some(coin)
    }

    /// Remove every coin. Returns how many were removed; calling it on an
    /// empty registry removes nothing.
    pub fn remove_all<S>(&mut self, world: &mut PhysicsWorld, sink: &mut S) -> usize
    where
        S: RenderSink<Proxy = P>,
    {
        let handles = self.handles();
        for handle in &handles {
            self.remove(*handle, world, sink);
        }
        handles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coin::COIN_TYPES;
    use crate::config::WorldConfig;
    use crate::sink::{HeadlessSink, Pose};
    use bevy::math::Vec3;
    use rapier3d::prelude::ColliderBuilder;

    fn spawn(
        registry: &mut BodyRegistry<u32>,
        world: &mut PhysicsWorld,
        sink: &mut HeadlessSink,
    ) -> CoinHandle {
        let pose = Pose::from_translation(Vec3::new(0.0, 0.1, 0.0));
        let body = world.create_dynamic_body(pose, 0.0, 0.0);
        let collider = world.create_collider(ColliderBuilder::cylinder(0.001, 0.01).build(), body);
        let proxy = sink.attach_coin(0, &COIN_TYPES[0], pose);
        registry.add(CoinBody {
            body,
            collider,
            coin_type: 0,
            spawned_at: Duration::ZERO,
            proxy,
        })
    }

    fn setup() -> (BodyRegistry<u32>, PhysicsWorld, HeadlessSink) {
        (
            BodyRegistry::new(),
            PhysicsWorld::new(&WorldConfig::default()).unwrap(),
            HeadlessSink::new(),
        )
    }

    #[test]
    fn test_remove_takes_body_and_proxy_together() {
        let (mut registry, mut world, mut sink) = setup();
        let handle = spawn(&mut registry, &mut world, &mut sink);
        let coin = *registry.get(handle).unwrap();

        assert!(world.contains_body(coin.body));
        assert!(sink.is_attached(coin.proxy));

        let removed = registry.remove(handle, &mut world, &mut sink).unwrap();
        assert_eq!(removed, coin);
        assert!(!world.contains_body(coin.body));
        assert!(world.collider(coin.collider).is_none());
        assert!(!sink.is_attached(coin.proxy));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_stale_handle_is_rejected() {
        let (mut registry, mut world, mut sink) = setup();
        let first = spawn(&mut registry, &mut world, &mut sink);
        registry.remove(first, &mut world, &mut sink);

        // Reuses the slot with a new generation
        let second = spawn(&mut registry, &mut world, &mut sink);
        assert_ne!(first, second);
        assert!(registry.get(first).is_none());
        assert!(registry.remove(first, &mut world, &mut sink).is_none());
        assert!(registry.contains(second));
        assert_eq!(sink.coin_count(), 1);
    }

    #[test]
    fn test_remove_all_is_idempotent() {
        let (mut registry, mut world, mut sink) = setup();
        for _ in 0..5 {
            spawn(&mut registry, &mut world, &mut sink);
        }
        assert_eq!(registry.len(), 5);

        assert_eq!(registry.remove_all(&mut world, &mut sink), 5);
        assert_eq!(registry.len(), 0);
        assert_eq!(world.body_count(), 0);
        assert_eq!(sink.coin_count(), 0);

        let detached = sink.detached_count();
        assert_eq!(registry.remove_all(&mut world, &mut sink), 0);
        assert_eq!(sink.detached_count(), detached, "no removals on empty registry");
    }

    #[test]
    fn test_iter_visits_only_live_coins() {
        let (mut registry, mut world, mut sink) = setup();
        let a = spawn(&mut registry, &mut world, &mut sink);
        let b = spawn(&mut registry, &mut world, &mut sink);
        let c = spawn(&mut registry, &mut world, &mut sink);
        registry.remove(b, &mut world, &mut sink);

        let handles = registry.handles();
        assert_eq!(handles.len(), 2);
        assert!(handles.contains(&a));
        assert!(handles.contains(&c));
        assert!(!handles.contains(&b));
    }
}
