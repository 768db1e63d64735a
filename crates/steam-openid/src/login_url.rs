/* Copyright (C) 2024  AlphaKeks <alphakeks@dawn.sh>
 *
 * This library is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This library is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this repository.  If not, see <https://www.gnu.org/licenses/>.
 */

use url::Url;

use crate::{IDENTIFIER_SELECT, LOGIN_URL, NAMESPACE};

/// Constructs a URL for OpenID 2.0 login with Steam.
///
/// Steam will redirect the user to `return_to` after the login process is complete.
#[tracing::instrument(level = "trace", fields(return_to = return_to.as_str()), ret(Display))]
pub fn login_url(return_to: &Url) -> Url {
    let mut url = Url::parse(LOGIN_URL).expect("hard-coded URL should be valid");

    url.query_pairs_mut()
        .append_pair("openid.mode", "checkid_setup")
        .append_pair("openid.ns", NAMESPACE)
        .append_pair("openid.identity", IDENTIFIER_SELECT)
        .append_pair("openid.claimed_id", IDENTIFIER_SELECT)
        .append_pair("openid.return_to", return_to.as_str());

    url
}
