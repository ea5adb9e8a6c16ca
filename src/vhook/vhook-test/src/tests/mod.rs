/*
 * vHook SMTP to webhook relay
 * Copyright (C) 2022 viridIT SAS
 *
 * This program is free software: you can redistribute it and/or modify it under
 * the terms of the GNU General Public License as published by the Free Software
 * Foundation, either version 3 of the License, or any later version.
 *
 * This program is distributed in the hope that it will be useful, but WITHOUT
 * ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
 * FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License along with
 * this program. If not, see https://www.gnu.org/licenses/.
 *
*/

mod e2e;

/// A message posted to `sec123+orders@mail.example`, with a dot-stuffed line.
pub const MESSAGE: &str = concat!(
    "From: John Doe <john@doe.example>\r\n",
    "To: sec123+orders@mail.example\r\n",
    "Subject: Order 42\r\n",
    "Date: Tue, 30 Nov 2021 20:54:27 +0100\r\n",
    "\r\n",
    "Your order is ready.\r\n",
    "..dotted line\r\n",
    ".\r\n",
);

/// [`MESSAGE`] as received by the webhook in raw mode.
pub const MESSAGE_UNSTUFFED: &str = concat!(
    "From: John Doe <john@doe.example>\r\n",
    "To: sec123+orders@mail.example\r\n",
    "Subject: Order 42\r\n",
    "Date: Tue, 30 Nov 2021 20:54:27 +0100\r\n",
    "\r\n",
    "Your order is ready.\r\n",
    ".dotted line\r\n",
);
