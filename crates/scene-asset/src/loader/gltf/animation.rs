use glam::Vec4;
use gltf::animation::{Interpolation as GltfInterpolation, Property};

use super::{
    accessor::{component_count, read_f32},
    GltfDocumentLoader,
};
use crate::{
    animation::{Animation, AnimationChannel, AnimationSampler, ChannelPath, Interpolation},
    error::{ImportError, ImportWarning},
    model::Model,
};

impl GltfDocumentLoader<'_> {
    fn load_animation_sampler(
        &self,
        sampler: gltf::animation::Sampler,
    ) -> Result<AnimationSampler, ImportError> {
        let interpolation = match sampler.interpolation() {
            GltfInterpolation::Linear => Interpolation::Linear,
            GltfInterpolation::Step => Interpolation::Step,
            GltfInterpolation::CubicSpline => Interpolation::CubicSpline,
        };
        let inputs = read_f32(self.data, &sampler.input())?;
        let output = sampler.output();
        let stride = component_count(output.dimensions());
        let outputs = read_f32(self.data, &output)?;
        let outputs_vec4 = outputs
            .chunks_exact(stride)
            .map(|value| {
                let mut padded = [0.0; 4];
                for (slot, component) in padded.iter_mut().zip(value) {
                    *slot = *component;
                }
                Vec4::from_array(padded)
            })
            .collect();

        Ok(AnimationSampler {
            interpolation,
            inputs,
            outputs,
            outputs_vec4,
            stride,
        })
    }

    /// Load every animation of the document. Channels that target nodes
    /// outside the built graph, or animate morph weights, are reported and
    /// dropped.
    pub(super) fn load_animations(&mut self, model: &Model) -> Result<Vec<Animation>, ImportError> {
        let document = self.document;
        let mut animations = Vec::new();
        for animation in document.animations() {
            let samplers = animation
                .samplers()
                .map(|sampler| self.load_animation_sampler(sampler))
                .collect::<Result<Vec<_>, _>>()?;

            let mut start = f32::MAX;
            let mut end = f32::MIN;
            for sampler in &samplers {
                if let (Some(first), Some(last)) = (sampler.inputs.first(), sampler.inputs.last()) {
                    start = start.min(*first);
                    end = end.max(*last);
                }
            }
            if start > end {
                start = 0.0;
                end = 0.0;
            }

            let mut channels = Vec::new();
            for (index, channel) in animation.channels().enumerate() {
                let target = channel.target();
                let path = match target.property() {
                    Property::Translation => ChannelPath::Translation,
                    Property::Rotation => ChannelPath::Rotation,
                    Property::Scale => ChannelPath::Scale,
                    Property::MorphTargetWeights => {
                        self.report.warn(ImportWarning::UnsupportedChannelPath {
                            animation: animation.index(),
                            channel: index,
                        });
                        continue;
                    }
                };
                let Some(node) = model.node_from_index(target.node().index()) else {
                    self.report.warn(ImportWarning::MissingAnimationTarget {
                        animation: animation.index(),
                        channel: index,
                        node: target.node().index(),
                    });
                    continue;
                };
                channels.push(AnimationChannel {
                    path,
                    node,
                    sampler: channel.sampler().index(),
                });
            }

            animations.push(Animation {
                name: animation
                    .name()
                    .map(str::to_string)
                    .unwrap_or_else(|| animation.index().to_string()),
                samplers,
                channels,
                start,
                end,
            });
        }
        Ok(animations)
    }
}
