//! One instanced particle group: a set of N billboards sharing a sprite and
//! motion parameters, each with its own rest attributes. Rest positions are
//! immutable; every frame the displayed transform is recomputed relative to
//! them, so motion never accumulates drift.

use crate::config::MotionParams;
use crate::constants::{
    FOCAL_ATTRACT_COEFF, FOCAL_DIST_FALLOFF, GLOBAL_PHASE_SPACING, ParticleGroupPreset,
    SPARKLE_FRAME_CHANCE, SPARKLE_STRIDE,
};
use crate::motion::{ColorPulse, FocalPoint, GlobalMotion};
use crate::render::{GroupGpu, InstanceRaw};
use crate::sim::{self, Hsl, InitialData};
use glam::{EulerRot, Mat4, Quat, Vec3};
use rand::Rng;

struct ParticleInstance {
    rest: Vec3,
    scale: f32,
    phase: f32,
    #[allow(dead_code)]
    speed: f32,
    opacity: f32,
}

struct GroupMotionState {
    time: f32,
    rotation_speed: f32,
    wave_speed: f32,
    wave_amplitude: f32,
    pulse_frequency: f32,
    pulse_amplitude: f32,
}

pub struct ParticleGroup {
    pub(crate) gpu: GroupGpu,
    instances: Vec<ParticleInstance>,
    raw: Vec<InstanceRaw>,
    motion: GroupMotionState,
    base: Hsl,
    base_rgb: [f32; 3],
    index: usize,
    size: f32,
}

impl ParticleGroup {
    /// Assemble a group from backend-generated attributes and pre-allocated
    /// GPU resources, and upload the initial instance state.
    pub fn build<R: Rng>(
        rng: &mut R,
        index: usize,
        preset: &ParticleGroupPreset,
        motion_params: MotionParams,
        data: &InitialData,
        base: Hsl,
        gpu: GroupGpu,
        queue: &wgpu::Queue,
    ) -> Self {
        let count = data.scales.len();
        let mut instances = Vec::with_capacity(count);
        let mut raw = Vec::with_capacity(count);
        for i in 0..count {
            let rest = Vec3::new(
                data.positions[i * 3],
                data.positions[i * 3 + 1],
                data.positions[i * 3 + 2],
            );
            let instance = ParticleInstance {
                rest,
                scale: data.scales[i],
                phase: data.phases[i],
                speed: data.speeds[i],
                opacity: data.opacities[i],
            };
            let model = Mat4::from_scale_rotation_translation(
                Vec3::splat(preset.size * instance.scale),
                Quat::IDENTITY,
                rest,
            );
            raw.push(InstanceRaw {
                model: model.to_cols_array_2d(),
                color: [
                    data.colors[i * 3],
                    data.colors[i * 3 + 1],
                    data.colors[i * 3 + 2],
                    instance.opacity,
                ],
            });
            instances.push(instance);
        }

        let group = Self {
            gpu,
            instances,
            raw,
            motion: GroupMotionState {
                // Random start time decorrelates the layers' pulse phases.
                time: rng.gen::<f32>() * 1000.0,
                rotation_speed: preset.rotation_speed * motion_params.rotation,
                wave_speed: preset.wave_speed * motion_params.wave,
                wave_amplitude: preset.wave_amplitude * motion_params.wave,
                pulse_frequency: preset.pulse_frequency * motion_params.pulse,
                pulse_amplitude: preset.pulse_amplitude * motion_params.pulse,
            },
            base,
            base_rgb: sim::hsl_to_rgb(base.h, base.s, base.l),
            index,
            size: preset.size,
        };
        queue.write_buffer(&group.gpu.instance_buffer, 0, bytemuck::cast_slice(&group.raw));
        group.write_uniform(queue, 0.8);
        group
    }

    pub fn count(&self) -> usize {
        self.instances.len()
    }

    /// Palette drift lands here: retint the group around a new base color.
    pub fn set_base_color(&mut self, rgb: [f32; 3]) {
        self.base_rgb = rgb;
        self.base = sim::rgb_to_hsl(rgb);
    }

    /// Advance this group by `delta` seconds and push the result to the GPU.
    ///
    /// `update_fraction` is the per-instance probability of recomputing the
    /// transform this frame; skipped instances keep last frame's matrix.
    #[allow(clippy::too_many_arguments)]
    pub fn update<R: Rng>(
        &mut self,
        queue: &wgpu::Queue,
        rng: &mut R,
        delta: f32,
        focal: &FocalPoint,
        global: &GlobalMotion,
        color_pulse: &ColorPulse,
        update_fraction: f32,
    ) {
        self.motion.time += delta;
        let m = &self.motion;
        let time = m.time;
        let pulse_factor = (time * m.pulse_frequency).sin() * m.pulse_amplitude + 1.0;

        // Throttled sparkle: a subset of frames, every SPARKLE_STRIDE-th
        // instance, nudged around the group base color.
        if rng.gen::<f32>() < SPARKLE_FRAME_CHANCE {
            let factor = color_pulse.factor();
            for i in (0..self.instances.len()).step_by(SPARKLE_STRIDE) {
                let rgb = sim::sparkle_color(self.base, i, color_pulse.time, factor);
                self.raw[i].color[0] = rgb[0];
                self.raw[i].color[1] = rgb[1];
                self.raw[i].color[2] = rgb[2];
            }
        }

        // Alternate rotation direction between adjacent layers.
        let dir = if self.index % 2 == 0 { 1.0 } else { -1.0 };
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            time * m.rotation_speed * dir,
            time * m.rotation_speed * 1.5,
            time * m.rotation_speed * 0.5 * -dir,
        );
        let breath = 1.0 + (time * 0.5).sin() * 0.1;
        let focal_pos = Vec3::from_array(focal.current);

        for (i, instance) in self.instances.iter().enumerate() {
            if rng.gen::<f32>() > update_fraction {
                continue;
            }
            let rest = instance.rest;
            let particle_time = time * m.wave_speed + instance.phase;
            let wave = Vec3::new(
                (particle_time + rest.x).sin(),
                (particle_time * 0.8 + rest.y * 2.0).cos(),
                (particle_time * 1.2 + rest.z * 1.5).sin(),
            ) * m.wave_amplitude;

            let g = global.offset(i, GLOBAL_PHASE_SPACING);
            let to_focal = rest - focal_pos;
            let distance_factor = 1.0 / (1.0 + to_focal.length() * FOCAL_DIST_FALLOFF);

            let position = rest + wave * pulse_factor + Vec3::from_array(g)
                - to_focal * distance_factor * FOCAL_ATTRACT_COEFF;
            let scale = self.size * instance.scale * breath;
            let model = Mat4::from_scale_rotation_translation(Vec3::splat(scale), rotation, position);
            self.raw[i].model = model.to_cols_array_2d();
        }

        queue.write_buffer(&self.gpu.instance_buffer, 0, bytemuck::cast_slice(&self.raw));
        let opacity = 0.6 + (time * 0.5).sin() * 0.2;
        self.write_uniform(queue, opacity);
    }

    fn write_uniform(&self, queue: &wgpu::Queue, opacity: f32) {
        let tint = [self.base_rgb[0], self.base_rgb[1], self.base_rgb[2], opacity];
        queue.write_buffer(&self.gpu.uniform_buffer, 0, bytemuck::cast_slice(&tint));
    }
}
