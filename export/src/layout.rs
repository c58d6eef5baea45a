//! The order in which computed channels are written to output bytes.
use core::{fmt, str::FromStr};

use crate::error::{ErrorKind, ExportError};

/// A semantic color channel of a computed pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Channel {
    /// The first source channel, or the gray value.
    R = 0,
    /// The second source channel.
    G = 1,
    /// The third source channel.
    B = 2,
    /// The fourth source channel, fully opaque when missing.
    A = 3,
}

/// A permutation assigning each of the four output bytes a computed channel.
///
/// The layout is validated on construction: every channel appears exactly once. The remap
/// itself therefore never has to deal with missing or duplicate channels.
///
/// ```
/// use imwatch_export::{Channel, PixelLayout};
///
/// let layout: PixelLayout = "bgra".parse()?;
/// assert_eq!(layout.channel_at(0), Channel::B);
/// assert_eq!(layout.remap([1, 2, 3, 4]), [3, 2, 1, 4]);
/// # Ok::<(), imwatch_export::ExportError>(())
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelLayout {
    /// For each output position, the index of the computed channel to place there.
    order: [u8; 4],
}

impl Channel {
    const ALL: [Channel; 4] = [Channel::R, Channel::G, Channel::B, Channel::A];

    fn from_letter(letter: char) -> Option<Self> {
        Some(match letter.to_ascii_lowercase() {
            'r' => Channel::R,
            'g' => Channel::G,
            'b' => Channel::B,
            'a' => Channel::A,
            _ => return None,
        })
    }

    /// The lower case letter naming this channel in layout strings.
    pub fn letter(self) -> char {
        match self {
            Channel::R => 'r',
            Channel::G => 'g',
            Channel::B => 'b',
            Channel::A => 'a',
        }
    }

    /// The index of the channel within a computed pixel.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl PixelLayout {
    /// The identity layout, computed channels are written in order.
    pub const RGBA: Self = PixelLayout {
        order: [0, 1, 2, 3],
    };

    /// Red and blue swapped, as used by many windowing systems.
    pub const BGRA: Self = PixelLayout {
        order: [2, 1, 0, 3],
    };

    /// Construct a layout from the channel of each output position.
    ///
    /// Fails if any channel is missing, and hence another is duplicated.
    pub fn new(channels: [Channel; 4]) -> Result<Self, ExportError> {
        let mut seen = [false; 4];
        for channel in channels {
            if core::mem::replace(&mut seen[channel.index()], true) {
                return Err(ExportError::new(
                    ErrorKind::MalformedPixelLayout,
                    "each of r, g, b, a must appear exactly once",
                ));
            }
        }

        Ok(PixelLayout {
            order: channels.map(|ch| ch as u8),
        })
    }

    /// The channel written to output position `slot`.
    ///
    /// # Panics
    ///
    /// When `slot` is not smaller than four.
    pub fn channel_at(&self, slot: usize) -> Channel {
        Channel::ALL[usize::from(self.order[slot])]
    }

    /// Whether this is the identity layout.
    pub fn is_identity(&self) -> bool {
        *self == Self::RGBA
    }

    /// Move computed channels to their output positions.
    #[inline]
    pub fn remap<T: Copy>(&self, computed: [T; 4]) -> [T; 4] {
        self.order.map(|idx| computed[usize::from(idx)])
    }
}

impl Default for PixelLayout {
    fn default() -> Self {
        PixelLayout::RGBA
    }
}

impl FromStr for PixelLayout {
    type Err = ExportError;

    /// Parse four letters out of `r`, `g`, `b`, `a` in any case, such as `"bgra"`.
    fn from_str(layout: &str) -> Result<Self, Self::Err> {
        let malformed = |msg| ExportError::new(ErrorKind::MalformedPixelLayout, msg);

        let mut letters = layout.chars();
        let mut channels = [Channel::R; 4];
        for channel in &mut channels {
            let letter = letters
                .next()
                .ok_or_else(|| malformed("expected four channel letters"))?;
            *channel = Channel::from_letter(letter)
                .ok_or_else(|| malformed("channel letters must be one of r, g, b, a"))?;
        }

        if letters.next().is_some() {
            return Err(malformed("expected four channel letters"));
        }

        PixelLayout::new(channels)
    }
}

impl fmt::Display for PixelLayout {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use fmt::Write as _;
        for slot in 0..4 {
            f.write_char(self.channel_at(slot).letter())?;
        }
        Ok(())
    }
}

impl fmt::Debug for PixelLayout {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PixelLayout({})", self)
    }
}

#[test]
fn parse_permutations() {
    for name in ["rgba", "bgra", "argb", "abgr", "gbar", "RGBA", "BgrA"] {
        let layout: PixelLayout = name.parse().expect("A permutation");
        assert_eq!(layout.to_string(), name.to_ascii_lowercase());
    }

    assert_eq!("rgba".parse::<PixelLayout>().unwrap(), PixelLayout::RGBA);
    assert_eq!("bgra".parse::<PixelLayout>().unwrap(), PixelLayout::BGRA);
}

#[test]
fn reject_malformed() {
    for name in ["", "rgb", "rgbaa", "rgbb", "rrga", "rgbx", "rgb ", "r g b a"] {
        let err = name.parse::<PixelLayout>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedPixelLayout, "for {:?}", name);
    }
}

#[test]
fn remap_places_channels() {
    let argb: PixelLayout = "argb".parse().unwrap();
    assert_eq!(argb.remap([10, 20, 30, 40]), [40, 10, 20, 30]);
    assert_eq!(PixelLayout::RGBA.remap([10, 20, 30, 40]), [10, 20, 30, 40]);
    assert!(PixelLayout::default().is_identity());
}
