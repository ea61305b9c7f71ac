// Copyright 2018 Dmitry Tantsur <divius.inside@gmail.com>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Machine images.
//!
//! Images are unclaimed drives, either owned by the account or provided by
//! the public library. Launching a server clones the image drive.

mod images;

pub use self::images::{list_supported_formats, ImageFormat, ImageState, MachineImage};
pub(crate) use self::images::{
    image_server, is_image_shared_with_public, list_images, list_images_owned_by, search_images,
};
