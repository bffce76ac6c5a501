use crate::animation::Animation;
use crate::error::{self, MalformedFileError};
use crate::joint::{BoneMesh, Joint};
use crate::node::{SceneGraph, TransformNode};
use crate::orientation::bone_shape;
use crate::types::*;
use cgmath::{InnerSpace, Matrix4, SquareMatrix, Zero};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

type ParseResult<T> = std::result::Result<T, MalformedFileError>;

/// Trimmed line with its 1-based line number.
type Line<'a> = (usize, &'a str);

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

fn re_joint() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(ROOT|JOINT)\s+(.+)$").expect("joint regex"))
}

fn re_end_site() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^end(\s+site)?$").expect("end site regex"))
}

/// `Frames: 120`, `Frame Time: 0.0083` - the value is whatever follows the last colon.
fn re_header_value() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^:]*:\s*(\S*)\s*$").expect("header regex"))
}

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// A joint as read from the hierarchy, before it gets a scene node.
#[derive(Debug)]
struct PendingJoint {
    label: String,
    offset: Position,
    channels: Vec<Channel>,
    parent: Option<Index>,
    children: Vec<Index>,
}

impl PendingJoint {
    fn new(label: String) -> Self {
        PendingJoint {
            label,
            offset: Position::zero(),
            channels: Vec::new(),
            parent: None,
            children: Vec::new(),
        }
    }
}

#[derive(Debug)]
struct Hierarchy {
    joints: Vec<PendingJoint>,
    roots: Vec<Index>,
    offset_sum: f64,
}

impl Hierarchy {
    fn channel_count(&self) -> usize {
        self.joints.iter().map(|j| j.channels.len()).sum()
    }

    /// Average offset length over everything but the roots.
    fn average_bone_length(&self) -> f64 {
        let bones = self.joints.len() - self.roots.len();
        if bones == 0 {
            return 0.0;
        }
        self.offset_sum / bones as f64
    }
}

#[derive(Debug)]
struct Motion {
    frame_count: usize,
    frame_time: f64,
    frames: Vec<Vec<f64>>,
}

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

fn __parse_f64(line: usize, token: &str) -> ParseResult<f64> {
    token
        .parse::<f64>()
        .map_err(|_| MalformedFileError::InvalidNumber {
            line,
            token: token.to_string(),
        })
}

fn __header_value<'a>(line: Line<'a>, what: &'static str) -> ParseResult<&'a str> {
    let (line_no, text) = line;
    re_header_value()
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .filter(|v| !v.is_empty())
        .ok_or(MalformedFileError::MissingValue {
            line: line_no,
            what,
        })
}

/// Single pass over the hierarchy lines. Opening a joint or end site pushes it on the
/// stack; `}` pops and hangs the popped joint under the new top of the stack.
fn __parse_hierarchy(lines: &[Line]) -> ParseResult<Hierarchy> {
    let mut joints: Vec<PendingJoint> = Vec::new();
    let mut roots: Vec<Index> = Vec::new();
    let mut stack: Vec<Index> = Vec::new();
    let mut offset_sum = 0.0;
    let mut site_count = 0;
    let mut last_line = 0;

    for &(line_no, line) in lines {
        last_line = line_no;
        let mut tokens = line.split_whitespace();
        let keyword = match tokens.next() {
            Some(keyword) => keyword,
            None => continue,
        };
        let unexpected = || MalformedFileError::UnexpectedToken {
            line: line_no,
            token: keyword.to_string(),
        };

        if let Some(captures) = re_joint().captures(line) {
            //// Create joint
            let is_root = &captures[1] == "ROOT";
            // a ROOT nested in a block, or a JOINT outside of one
            if is_root != stack.is_empty() {
                return Err(unexpected());
            }
            let index = joints.len();
            joints.push(PendingJoint::new(captures[2].trim().to_string()));
            if is_root {
                roots.push(index);
            }
            stack.push(index);
        } else if keyword == "ROOT" || keyword == "JOINT" {
            return Err(MalformedFileError::MissingValue {
                line: line_no,
                what: "joint name",
            });
        } else if re_end_site().is_match(line) {
            //// Create end site
            if stack.is_empty() {
                return Err(unexpected());
            }
            let index = joints.len();
            joints.push(PendingJoint::new(format!("End Site{}", site_count)));
            site_count += 1;
            stack.push(index);
        } else if keyword == "{" {
            continue;
        } else if keyword == "}" {
            //// Close block
            let closed = stack.pop().ok_or(MalformedFileError::UnbalancedBlock {
                line: line_no,
                reason: "`}` without an open block",
            })?;
            if let Some(&parent) = stack.last() {
                joints[closed].parent = Some(parent);
                joints[parent].children.push(closed);
            }
        } else if keyword == "OFFSET" {
            //// Parse offset
            let top = *stack.last().ok_or_else(unexpected)?;
            let mut xyz = [0.0; 3];
            for value in xyz.iter_mut() {
                let token = tokens.next().ok_or(MalformedFileError::MissingValue {
                    line: line_no,
                    what: "offset component",
                })?;
                *value = __parse_f64(line_no, token)?;
            }
            let offset = Position::new(xyz[0], xyz[1], xyz[2]);
            offset_sum += offset.magnitude();
            joints[top].offset = offset;
        } else if keyword == "CHANNELS" {
            //// Parse channels (declaration order is kept as is)
            let top = *stack.last().ok_or_else(unexpected)?;
            let count_token = tokens.next().ok_or(MalformedFileError::MissingValue {
                line: line_no,
                what: "channel count",
            })?;
            let declared = count_token
                .parse::<usize>()
                .map_err(|_| MalformedFileError::InvalidNumber {
                    line: line_no,
                    token: count_token.to_string(),
                })?;
            let names: Vec<&str> = tokens.collect();
            if names.len() != declared {
                return Err(MalformedFileError::ChannelCountMismatch {
                    line: line_no,
                    declared,
                    listed: names.len(),
                });
            }
            joints[top].channels = names
                .iter()
                .map(|name| {
                    Channel::from_name(name).ok_or(MalformedFileError::UnexpectedToken {
                        line: line_no,
                        token: name.to_string(),
                    })
                })
                .collect::<ParseResult<Vec<Channel>>>()?;
        } else {
            return Err(unexpected());
        }
    }

    if !stack.is_empty() {
        return Err(MalformedFileError::UnbalancedBlock {
            line: last_line,
            reason: "block left open at end of hierarchy",
        });
    }
    if roots.is_empty() {
        return Err(MalformedFileError::EmptyHierarchy);
    }

    Ok(Hierarchy {
        joints,
        roots,
        offset_sum,
    })
}

/// `Frames:` line, `Frame Time:` line, then one record per frame.
fn __parse_motion(lines: &[Line], marker_line: usize, channel_count: usize) -> ParseResult<Motion> {
    let mut rows = lines.iter().copied().filter(|(_, line)| !line.is_empty());

    let frames_line = rows.next().ok_or(MalformedFileError::MissingValue {
        line: marker_line,
        what: "frame count",
    })?;
    let token = __header_value(frames_line, "frame count")?;
    let frame_count = token
        .parse::<usize>()
        .map_err(|_| MalformedFileError::InvalidNumber {
            line: frames_line.0,
            token: token.to_string(),
        })?;

    let time_line = rows.next().ok_or(MalformedFileError::MissingValue {
        line: frames_line.0,
        what: "frame time",
    })?;
    let token = __header_value(time_line, "frame time")?;
    let frame_time = __parse_f64(time_line.0, token)?;
    if !(frame_time > 0.0 && frame_time.is_finite()) {
        return Err(MalformedFileError::InvalidNumber {
            line: time_line.0,
            token: token.to_string(),
        });
    }

    // `Frames:` is only checked against the records once they are all read
    let mut frames: Vec<Vec<f64>> = Vec::new();
    for (line_no, line) in rows {
        let record = line
            .split_whitespace()
            .map(|token| __parse_f64(line_no, token))
            .collect::<ParseResult<Vec<f64>>>()?;
        if record.len() != channel_count {
            return Err(MalformedFileError::FrameLengthMismatch {
                line: line_no,
                expected: channel_count,
                found: record.len(),
            });
        }
        frames.push(record);
    }

    if frames.len() != frame_count {
        return Err(MalformedFileError::FrameCountMismatch {
            declared: frame_count,
            found: frames.len(),
        });
    }

    Ok(Motion {
        frame_count,
        frame_time,
        frames,
    })
}

/// Turn the parsed hierarchy into scene nodes and joints. Parents always precede their
/// children in `hierarchy.joints`, so every parent node exists before its children.
fn __assemble(hierarchy: Hierarchy, motion: Motion) -> Animation {
    let thickness = hierarchy.average_bone_length() / 3.0;
    let mut graph = SceneGraph::new();
    let mut joints: Vec<Joint> = Vec::with_capacity(hierarchy.joints.len());
    let mut column = 0;

    for (index, pending) in hierarchy.joints.iter().enumerate() {
        let shape = bone_shape(pending.offset, thickness);
        let (name, node) = match pending.parent {
            Some(parent) => {
                let parent_joint: &Joint = &joints[parent];
                // offsets chain through the parent: the bone starts at the parent's pivot
                let link = Matrix4::from_translation(parent_joint.offset);
                let node = graph.insert_child(parent_joint.node, TransformNode::new(link, shape));
                (format!("{}-{}", parent_joint.label, pending.label), node)
            }
            None => (
                pending.label.clone(),
                graph.insert(TransformNode::new(Matrix::identity(), shape)),
            ),
        };

        let mesh = if pending.parent.is_some() && pending.offset.magnitude() > 0.0 {
            Some(BoneMesh {
                color: DEFAULT_BONE_COLOR,
                enabled: true,
            })
        } else {
            None
        };

        let motion_range = column..column + pending.channels.len();
        column = motion_range.end;

        joints.push(Joint {
            name,
            label: pending.label.clone(),
            index,
            parent: pending.parent,
            children: pending.children.clone(),
            node,
            offset: pending.offset,
            channels: pending.channels.clone(),
            motion_range,
            channel_transform: Matrix::identity(),
            mesh,
        });
    }

    Animation::new(
        joints,
        hierarchy.roots,
        graph,
        motion.frames,
        motion.frame_time,
        thickness,
    )
}

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

fn parse_bvh(text: &str) -> ParseResult<Animation> {
    let lines: Vec<Line> = text
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .collect();

    let find_marker = |marker: &str| {
        lines
            .iter()
            .position(|(_, line)| line.split_whitespace().next() == Some(marker))
    };
    let hierarchy_start =
        find_marker("HIERARCHY").ok_or(MalformedFileError::MissingSection("HIERARCHY"))?;
    let motion_start =
        find_marker("MOTION").ok_or(MalformedFileError::MissingSection("MOTION"))?;
    if motion_start < hierarchy_start {
        return Err(MalformedFileError::UnexpectedToken {
            line: lines[motion_start].0,
            token: "MOTION".to_string(),
        });
    }

    let hierarchy = __parse_hierarchy(&lines[hierarchy_start + 1..motion_start])?;
    let motion = __parse_motion(
        &lines[motion_start + 1..],
        lines[motion_start].0,
        hierarchy.channel_count(),
    )?;
    debug_assert_eq!(motion.frame_count, motion.frames.len());

    Ok(__assemble(hierarchy, motion))
}

fn __log_summary(animation: &Animation) {
    log::info!("Number of frames: {}", animation.frame_count());
    log::info!("fps: {:.2}", animation.fps());
    log::info!(
        "Number of joints: {}",
        animation.joints().iter().filter(|j| j.has_motion()).count()
    );
    log::debug!(
        "List of all joint names: {:?}",
        animation
            .joints()
            .iter()
            .filter(|j| j.has_motion())
            .map(|j| j.label.as_str())
            .collect::<Vec<_>>()
    );
}

//////////////////////////////////////////////////////////////// PUBLIC ///////////////////////////////////////////////////////////////////////////////////

/// load a bvh file from a file path
pub fn load_bvh_from_file(file_path: impl AsRef<Path>) -> error::Result<Animation> {
    let file_path = file_path.as_ref();
    let contents = std::fs::read_to_string(file_path)?;
    log::info!("bvh file name: {}", file_path.display());
    let animation = parse_bvh(&contents)?;
    __log_summary(&animation);
    Ok(animation)
}

/// load a bvh file from a string
pub fn load_bvh_from_string(bvh_string: &str) -> Result<Animation, MalformedFileError> {
    let animation = parse_bvh(bvh_string)?;
    __log_summary(&animation);
    Ok(animation)
}

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
