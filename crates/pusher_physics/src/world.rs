//! Rapier world wrapper.
//!
//! Owns every rapier set and advances them with substeps no longer than the
//! configured maximum timestep, so thin fast coins stay stable regardless of
//! the display refresh rate.

use bevy::math::{Quat, Vec3};
use rapier3d::prelude as rapier;
use rapier::nalgebra::{Quaternion, UnitQuaternion, Vector3};

use crate::config::WorldConfig;
use crate::error::{SimError, SimResult};
use crate::sink::Pose;

pub struct PhysicsWorld {
    pub gravity: Vector3<f32>,
    pub integration_parameters: rapier::IntegrationParameters,
    pub physics_pipeline: rapier::PhysicsPipeline,
    pub island_manager: rapier::IslandManager,
    pub broad_phase: rapier::DefaultBroadPhase,
    pub narrow_phase: rapier::NarrowPhase,
    pub rigid_body_set: rapier::RigidBodySet,
    pub collider_set: rapier::ColliderSet,
    pub impulse_joint_set: rapier::ImpulseJointSet,
    pub multibody_joint_set: rapier::MultibodyJointSet,
    pub ccd_solver: rapier::CCDSolver,
    max_timestep: f32,
    max_frame_time: f32,
    linear_sleep_threshold: f32,
    angular_sleep_threshold: f32,
}

impl PhysicsWorld {
    /// Create an empty world. Fails when the settings cannot produce a
    /// stable simulation.
    pub fn new(config: &WorldConfig) -> SimResult<Self> {
        if !config.gravity.iter().all(|g| g.is_finite()) {
            return Err(SimError::InvalidWorld(format!(
                "gravity {:?} is not finite",
                config.gravity
            )));
        }
        if !(config.max_timestep.is_finite() && config.max_timestep > 0.0) {
            return Err(SimError::InvalidWorld(format!(
                "max timestep {} must be positive",
                config.max_timestep
            )));
        }
        if !(config.max_frame_time.is_finite() && config.max_frame_time >= config.max_timestep) {
            return Err(SimError::InvalidWorld(format!(
                "max frame time {} must be at least one timestep",
                config.max_frame_time
            )));
        }

        let [gx, gy, gz] = config.gravity;
        let mut integration_parameters = rapier::IntegrationParameters::default();
        integration_parameters.dt = config.max_timestep;

        Ok(Self {
            gravity: Vector3::new(gx, gy, gz),
            integration_parameters,
            physics_pipeline: rapier::PhysicsPipeline::new(),
            island_manager: rapier::IslandManager::new(),
            broad_phase: rapier::DefaultBroadPhase::new(),
            narrow_phase: rapier::NarrowPhase::new(),
            rigid_body_set: rapier::RigidBodySet::new(),
            collider_set: rapier::ColliderSet::new(),
            impulse_joint_set: rapier::ImpulseJointSet::new(),
            multibody_joint_set: rapier::MultibodyJointSet::new(),
            ccd_solver: rapier::CCDSolver::new(),
            max_timestep: config.max_timestep,
            max_frame_time: config.max_frame_time,
            linear_sleep_threshold: config.linear_sleep_threshold,
            angular_sleep_threshold: config.angular_sleep_threshold,
        })
    }

    pub fn max_timestep(&self) -> f32 {
        self.max_timestep
    }

    /// Advance the world by one frame of `elapsed` seconds.
    ///
    /// The frame is clamped to the maximum frame time and split into equal
    /// substeps no longer than the maximum timestep. Returns the number of
    /// substeps taken (0 for a zero-length frame).
    pub fn step(&mut self, elapsed: f32) -> SimResult<u32> {
        if !elapsed.is_finite() || elapsed < 0.0 {
            return Err(SimError::InvalidFrameTime(elapsed));
        }

        let elapsed = elapsed.min(self.max_frame_time);
        let substeps = substep_count(elapsed, self.max_timestep);
        if substeps == 0 {
            return Ok(0);
        }

        self.integration_parameters.dt = elapsed / substeps as f32;
        for _ in 0..substeps {
            self.step_once();
        }

        self.check_finite()?;
        Ok(substeps)
    }

    fn step_once(&mut self) {
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );
    }

    fn check_finite(&self) -> SimResult<()> {
        for (handle, body) in self.rigid_body_set.iter() {
            let t = body.translation();
            let r = body.rotation();
            let finite = [t.x, t.y, t.z, r.i, r.j, r.k, r.w]
                .iter()
                .all(|v| v.is_finite());
            if !finite {
                return Err(SimError::Diverged(handle));
            }
        }
        Ok(())
    }

    /// Insert a fixed body. Fixed bodies ignore forces but can be re-posed.
    pub fn create_fixed_body(&mut self, pose: Pose) -> rapier::RigidBodyHandle {
        let body = rapier::RigidBodyBuilder::fixed()
            .translation(to_vector(pose.translation))
            .rotation(to_rotation(pose.rotation).scaled_axis());
        self.rigid_body_set.insert(body)
    }

    /// Insert a dynamic body with the given damping.
    pub fn create_dynamic_body(
        &mut self,
        pose: Pose,
        linear_damping: f32,
        angular_damping: f32,
    ) -> rapier::RigidBodyHandle {
        let body = rapier::RigidBodyBuilder::dynamic()
            .translation(to_vector(pose.translation))
            .rotation(to_rotation(pose.rotation).scaled_axis())
            .linear_damping(linear_damping)
            .angular_damping(angular_damping);
        let handle = self.rigid_body_set.insert(body);

        // Let resting coins fall asleep quickly
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            let activation = body.activation_mut();
            activation.normalized_linear_threshold = self.linear_sleep_threshold;
            activation.angular_threshold = self.angular_sleep_threshold;
        }
        handle
    }

    /// Attach a collider to a body.
    pub fn create_collider(
        &mut self,
        collider: impl Into<rapier::Collider>,
        parent: rapier::RigidBodyHandle,
    ) -> rapier::ColliderHandle {
        self.collider_set
            .insert_with_parent(collider, parent, &mut self.rigid_body_set)
    }

    /// Remove a body together with its colliders. Returns false when the
    /// handle was already gone.
    pub fn remove_body(&mut self, handle: rapier::RigidBodyHandle) -> bool {
        self.rigid_body_set
            .remove(
                handle,
                &mut self.island_manager,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                true,
            )
            .is_some()
    }

    pub fn contains_body(&self, handle: rapier::RigidBodyHandle) -> bool {
        self.rigid_body_set.contains(handle)
    }

    pub fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }

    pub fn body(&self, handle: rapier::RigidBodyHandle) -> Option<&rapier::RigidBody> {
        self.rigid_body_set.get(handle)
    }

    pub fn body_mut(&mut self, handle: rapier::RigidBodyHandle) -> Option<&mut rapier::RigidBody> {
        self.rigid_body_set.get_mut(handle)
    }

    pub fn collider(&self, handle: rapier::ColliderHandle) -> Option<&rapier::Collider> {
        self.collider_set.get(handle)
    }

    /// Current pose of a body, or `None` if it does not exist.
    pub fn pose(&self, handle: rapier::RigidBodyHandle) -> Option<Pose> {
        let body = self.rigid_body_set.get(handle)?;
        let pos = body.translation();
        let rot = body.rotation();
        Some(Pose::new(
            Vec3::new(pos.x, pos.y, pos.z),
            Quat::from_xyzw(rot.i, rot.j, rot.k, rot.w),
        ))
    }

    /// Teleport a body to a new orientation.
    pub fn set_rotation(&mut self, handle: rapier::RigidBodyHandle, rotation: Quat) -> bool {
        match self.rigid_body_set.get_mut(handle) {
            Some(body) => {
                body.set_rotation(to_rotation(rotation), true);
                true
            }
            None => false,
        }
    }

    /// Teleport a body to a new position.
    pub fn set_translation(&mut self, handle: rapier::RigidBodyHandle, translation: Vec3) -> bool {
        match self.rigid_body_set.get_mut(handle) {
            Some(body) => {
                body.set_translation(to_vector(translation), true);
                true
            }
            None => false,
        }
    }

    /// Turn contact generation of a collider on or off.
    pub fn set_collider_enabled(&mut self, handle: rapier::ColliderHandle, enabled: bool) -> bool {
        match self.collider_set.get_mut(handle) {
            Some(collider) => {
                collider.set_enabled(enabled);
                true
            }
            None => false,
        }
    }
}

/// Number of equal substeps needed so none exceeds `max_timestep`.
fn substep_count(elapsed: f32, max_timestep: f32) -> u32 {
    if elapsed <= 0.0 {
        return 0;
    }
    // Tolerance keeps 1/60 at 240Hz from rounding up to 5 substeps
    ((elapsed / max_timestep - 1e-3).ceil().max(1.0)) as u32
}

pub(crate) fn to_vector(v: Vec3) -> Vector3<f32> {
    Vector3::new(v.x, v.y, v.z)
}

pub(crate) fn to_rotation(q: Quat) -> UnitQuaternion<f32> {
    UnitQuaternion::from_quaternion(Quaternion::new(q.w, q.x, q.y, q.z))
}
