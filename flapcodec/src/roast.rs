//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Password "roast" obfuscation.

use crate::consts::ROAST_KEY;

/// Apply the OSCAR password roast to `input`.
///
/// Each byte is XORed against the fixed 16-byte [`ROAST_KEY`], repeating the
/// key as needed. This is reversible obfuscation, not encryption — it exists
/// only for compatibility with historical clients, which transmit passwords
/// in this form during channel-1 sign-on. XOR is self-inverse, so applying
/// the roast twice returns the original bytes.
pub fn roast(input: &[u8]) -> Vec<u8> {
    input
        .iter()
        .enumerate()
        .map(|(i, byte)| byte ^ ROAST_KEY[i % ROAST_KEY.len()])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roast_self_inverse() {
        let password = b"penis";
        assert_eq!(roast(&roast(password)), password);
    }

    #[test]
    fn test_roast_known_vector() {
        // first bytes of the key XORed with "p", "e", "n"
        let roasted = roast(b"pen");
        assert_eq!(roasted, vec![0x70 ^ 0xF3, 0x65 ^ 0x26, 0x6E ^ 0x81]);
    }

    #[test]
    fn test_roast_wraps_past_key_length() {
        let input = vec![0u8; 20];
        let roasted = roast(&input);
        assert_eq!(roasted[16], ROAST_KEY[0]);
        assert_eq!(roasted[19], ROAST_KEY[3]);
    }

    #[test]
    fn test_roast_empty() {
        assert!(roast(&[]).is_empty());
    }
}
