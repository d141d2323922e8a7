use rand::Rng;
use serde::de::DeserializeOwned;

use crate::error::GenerateError;
use crate::reflect::{Reflect, TypeInfo, TypeKind};

/// Pick one declared variant of an enum uniformly.
///
/// Fails with [`GenerateError::NotAnEnum`] when `info` does not describe an enum.
pub fn enum_member<R: Rng + ?Sized>(
    rng: &mut R,
    info: &TypeInfo,
) -> Result<&'static str, GenerateError> {
    let TypeKind::Enum(enum_info) = &info.kind else {
        return Err(GenerateError::NotAnEnum {
            type_name: info.name(),
        });
    };
    if enum_info.variants.is_empty() {
        return Err(GenerateError::NoVariants {
            type_name: info.name(),
        });
    }
    Ok(enum_info.variants[rng.gen_range(0..enum_info.variants.len())])
}

/// Typed variant of [`enum_member`].
///
/// ```
/// use fixtura::{primitives, Reflect};
///
/// #[derive(Debug, PartialEq, serde::Deserialize, Reflect)]
/// enum Color { Red, Green }
///
/// let mut rng = rand::thread_rng();
/// let color: Color = primitives::random_enum(&mut rng).unwrap();
/// assert!(color == Color::Red || color == Color::Green);
///
/// // Not an enum:
/// assert!(primitives::random_enum::<i32, _>(&mut rng).is_err());
/// ```
pub fn random_enum<E, R>(rng: &mut R) -> Result<E, GenerateError>
where
    E: Reflect + DeserializeOwned,
    R: Rng + ?Sized,
{
    let info = E::type_info();
    let member = enum_member(rng, &info)?;
    serde_json::from_value(serde_json::Value::String(member.to_string())).map_err(|e| {
        GenerateError::Deserialize {
            type_name: info.name(),
            message: e.to_string(),
        }
    })
}
