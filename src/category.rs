use std::fmt;
use std::str::FromStr;

pub const CATEGORY_FIELD: &str = "Category";
pub const ID_FIELD: &str = "_id";
pub const CONNECTOR_TYPE_FIELD: &str = "ConnectorType";
pub const COUNT_FIELD: &str = "Count";

pub const MOBILE_FIELDS: &[&str] = &[
    "ProductId",
    "Title",
    "Manufacturer",
    "NetworkTechnology",
    "Dimensions",
    "Weight",
    "Display",
    "Bluetooth",
    "Sensors",
    "OS",
    "Chipset",
    "CPU",
    "GPU",
    "Memory",
    "Camera",
    "Battery",
];

pub const HEADPHONE_FIELDS: &[&str] = &[
    "ProductId",
    "Title",
    "Manufacturer",
    "HeadPhoneType",
    "Battery",
    "Warranty",
    "ConnectorType",
    "WithMicrophone",
    "ItemWeight",
    "Color",
    "AdditionalFeatures",
];

pub const CAMERA_FIELDS: &[&str] = &[
    "ProductId",
    "Title",
    "Manufacturer",
    "EffectivePixels",
    "Zoom",
    "Dimension",
    "Weight",
    "VideoResolution",
    "ShutterSpeed",
    "Battery",
];

/// Fields every product carries regardless of category.
pub const COMMON_FIELDS: &[&str] = &["Category", "ProductId", "Title", "Manufacturer"];

/// The three product kinds, in import order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Mobiles,
    Headphones,
    Cameras,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Mobiles, Category::Headphones, Category::Cameras];

    /// Literal stored in the `Category` field.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Mobiles => "Mobiles",
            Category::Headphones => "Headphones",
            Category::Cameras => "Cameras",
        }
    }

    /// Source table, unqualified.
    pub fn table(&self) -> &'static str {
        match self {
            Category::Mobiles => "mobiles",
            Category::Headphones => "headphones",
            Category::Cameras => "cameras",
        }
    }

    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            Category::Mobiles => MOBILE_FIELDS,
            Category::Headphones => HEADPHONE_FIELDS,
            Category::Cameras => CAMERA_FIELDS,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Category::ALL.into_iter().find(|c| c.label() == label)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(s) || c.table().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown category '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_lists_have_expected_shapes() {
        assert_eq!(Category::Mobiles.fields().len(), 16);
        assert_eq!(Category::Headphones.fields().len(), 11);
        assert_eq!(Category::Cameras.fields().len(), 10);
        for category in Category::ALL {
            assert_eq!(&category.fields()[..3], &COMMON_FIELDS[1..]);
            assert!(!category.fields().contains(&CATEGORY_FIELD));
        }
    }

    #[test]
    fn labels_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from_label(category.label()), Some(category));
            assert_eq!(category.table().parse::<Category>(), Ok(category));
        }
        assert_eq!(Category::from_label("mobiles"), None);
        assert!("tablets".parse::<Category>().is_err());
    }
}
